//! Integer codes reported by `sysmaster` and their labels.
//!
//! An unknown code is a mapping defect and is returned as `Error::Mapping`
//! instead of falling back to a generic label.

use crate::collectors::error::{Error, Result};

/// `sysshmvals.sh_mode`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServerMode {
    Offline,
    Initialisation,
    Quiescent,
    RssSecondary,
    Backup,
    Shutdown,
    Online,
    Abort,
}

impl ServerMode {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Offline => "Offline",
            Self::Initialisation => "Initialisation",
            Self::Quiescent => "Quiescent",
            Self::RssSecondary => "RSS secondary",
            Self::Backup => "Backup",
            Self::Shutdown => "Shutdown",
            Self::Online => "Online",
            Self::Abort => "Abort",
        }
    }
}

impl TryFrom<i64> for ServerMode {
    type Error = Error;

    fn try_from(code: i64) -> Result<Self> {
        match code {
            -1 => Ok(Self::Offline),
            0 => Ok(Self::Initialisation),
            1 => Ok(Self::Quiescent),
            2 => Ok(Self::RssSecondary),
            3 => Ok(Self::Backup),
            4 => Ok(Self::Shutdown),
            5 => Ok(Self::Online),
            6 => Ok(Self::Abort),
            code => Err(Error::Mapping {
                kind: "server mode",
                code,
            }),
        }
    }
}

/// `systhreads.th_state`. States 2, 3 and 6 exist but are undocumented.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThreadState {
    Running,
    IoWait,
    Unknown2,
    Unknown3,
    CondWait,
    Terminated,
    Unknown6,
    Sleeping,
}

impl ThreadState {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::IoWait => "IO Wait",
            Self::Unknown2 => "2-unknown",
            Self::Unknown3 => "3-unknown",
            Self::CondWait => "Cond Wait",
            Self::Terminated => "Terminated",
            Self::Unknown6 => "6-unknown",
            Self::Sleeping => "Sleeping",
        }
    }
}

impl TryFrom<i64> for ThreadState {
    type Error = Error;

    fn try_from(code: i64) -> Result<Self> {
        match code {
            0 => Ok(Self::Running),
            1 => Ok(Self::IoWait),
            2 => Ok(Self::Unknown2),
            3 => Ok(Self::Unknown3),
            4 => Ok(Self::CondWait),
            5 => Ok(Self::Terminated),
            6 => Ok(Self::Unknown6),
            7 => Ok(Self::Sleeping),
            code => Err(Error::Mapping {
                kind: "thread state",
                code,
            }),
        }
    }
}
