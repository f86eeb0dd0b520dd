// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structured service status codes.
//!
//! Servers report failures as numeric status codes. The engine only reacts to
//! a handful of them, so they get named variants; everything else travels as
//! [`StatusCode::Other`] with the raw code preserved for logging.

use std::fmt;

/// Top two bits: `00` good, `01` uncertain, `1x` bad.
const SEVERITY_MASK: u32 = 0xC000_0000;
const SEVERITY_UNCERTAIN: u32 = 0x4000_0000;

/// Status reported by the session collaborator or the server.
///
/// Failed requests always carry a bad status; `Good` only appears in
/// per-acknowledgement results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// The operation succeeded.
    Good,
    /// The operation timed out on the server side.
    BadTimeout,
    /// The session id is not valid (session expired or unknown).
    BadSessionIdInvalid,
    /// The session was closed by the client or the server.
    BadSessionClosed,
    /// The subscription id is not valid (discarded by the server).
    BadSubscriptionIdInvalid,
    /// The server has too many publish requests queued for this session.
    BadTooManyPublishRequests,
    /// The server has no subscription for this session.
    BadNoSubscription,
    /// An acknowledged sequence number is unknown to the server.
    BadSequenceNumberUnknown,
    /// The requested notification message is no longer available.
    BadMessageNotAvailable,
    /// The secure channel has been closed.
    BadSecureChannelClosed,
    /// The transport is not connected.
    BadNotConnected,
    /// The underlying connection was closed.
    BadConnectionClosed,
    /// Any other status, raw code preserved.
    Other(u32),
}

impl StatusCode {
    /// Map a raw numeric status to a structured condition.
    #[must_use]
    pub fn from_u32(code: u32) -> Self {
        match code {
            0 => Self::Good,
            0x800A_0000 => Self::BadTimeout,
            0x8025_0000 => Self::BadSessionIdInvalid,
            0x8026_0000 => Self::BadSessionClosed,
            0x8028_0000 => Self::BadSubscriptionIdInvalid,
            0x8078_0000 => Self::BadTooManyPublishRequests,
            0x8079_0000 => Self::BadNoSubscription,
            0x807A_0000 => Self::BadSequenceNumberUnknown,
            0x807B_0000 => Self::BadMessageNotAvailable,
            0x8086_0000 => Self::BadSecureChannelClosed,
            0x808A_0000 => Self::BadNotConnected,
            0x80AE_0000 => Self::BadConnectionClosed,
            other => Self::Other(other),
        }
    }

    /// Raw numeric status code.
    #[must_use]
    pub fn code(self) -> u32 {
        match self {
            Self::Good => 0,
            Self::BadTimeout => 0x800A_0000,
            Self::BadSessionIdInvalid => 0x8025_0000,
            Self::BadSessionClosed => 0x8026_0000,
            Self::BadSubscriptionIdInvalid => 0x8028_0000,
            Self::BadTooManyPublishRequests => 0x8078_0000,
            Self::BadNoSubscription => 0x8079_0000,
            Self::BadSequenceNumberUnknown => 0x807A_0000,
            Self::BadMessageNotAvailable => 0x807B_0000,
            Self::BadSecureChannelClosed => 0x8086_0000,
            Self::BadNotConnected => 0x808A_0000,
            Self::BadConnectionClosed => 0x80AE_0000,
            Self::Other(code) => code,
        }
    }

    /// Severity bits clear, subcode ignored.
    #[must_use]
    pub fn is_good(self) -> bool {
        self.code() & SEVERITY_MASK == 0
    }

    /// Transport or channel is unusable; cleared by reconnection.
    #[must_use]
    pub fn is_channel_failure(self) -> bool {
        matches!(
            self,
            Self::BadNotConnected | Self::BadSecureChannelClosed | Self::BadConnectionClosed
        )
    }

    /// The session itself is gone.
    #[must_use]
    pub fn is_session_failure(self) -> bool {
        matches!(self, Self::BadSessionClosed | Self::BadSessionIdInvalid)
    }

    fn name(self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::BadTimeout => "BadTimeout",
            Self::BadSessionIdInvalid => "BadSessionIdInvalid",
            Self::BadSessionClosed => "BadSessionClosed",
            Self::BadSubscriptionIdInvalid => "BadSubscriptionIdInvalid",
            Self::BadTooManyPublishRequests => "BadTooManyPublishRequests",
            Self::BadNoSubscription => "BadNoSubscription",
            Self::BadSequenceNumberUnknown => "BadSequenceNumberUnknown",
            Self::BadMessageNotAvailable => "BadMessageNotAvailable",
            Self::BadSecureChannelClosed => "BadSecureChannelClosed",
            Self::BadNotConnected => "BadNotConnected",
            Self::BadConnectionClosed => "BadConnectionClosed",
            Self::Other(code) => match code & SEVERITY_MASK {
                0 => "Good",
                SEVERITY_UNCERTAIN => "Uncertain",
                _ => "Bad",
            },
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:08X})", self.name(), self.code())
    }
}

impl std::error::Error for StatusCode {}

impl From<u32> for StatusCode {
    fn from(code: u32) -> Self {
        Self::from_u32(code)
    }
}
