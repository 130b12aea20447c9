//! # Lectoria Auth (Session & Credential Lifecycle)
//!
//! `lectoria` is the authentication authority for the Lectoria academic
//! platform (admin console + student dashboard). It owns the only mutable,
//! security-critical state in the platform: account credentials and the
//! refresh-token ledger.
//!
//! ## Token Model
//!
//! Clients authenticate once with email + password and receive a dual-token
//! pair:
//!
//! - **Access token:** short-lived (15 minutes), stateless JWT presented on
//!   every request via `Authorization: Bearer` or the session cookie.
//! - **Refresh token:** longer-lived (7 days) JWT tracked server-side in the
//!   ledger, exchanged for a new pair with rotation-on-use.
//!
//! The two token classes are signed with independent secrets so a leaked
//! access-token secret cannot mint long-lived refresh tokens.
//!
//! ## Rotation & Replay Defense
//!
//! Every successful refresh revokes the presented token and issues a
//! successor in one transaction. At most one concurrent rotation of a given
//! token can win; the loser sees the same opaque `Invalid token` response as
//! any other rejected token. Revoked rows are kept as an audit trail.
//!
//! ## Authorization
//!
//! Request handlers authenticate through the principal helpers, which
//! re-read the account on every request. Embedded JWT claims are never
//! trusted for role decisions, so role changes and disabled accounts take
//! effect immediately instead of at token expiry.

pub mod api;
pub mod cli;
