//! Typed callback payloads.
//!
//! Payloads are colon-separated: a tag, a job id or item token, optional
//! indices, and a mode code. Each tag has its own parser producing a typed
//! [`Callback`], so handlers never index into raw fields.

use thiserror::Error;

use crate::media::DeliveryMode;

/// Largest payload the chat platform accepts.
pub const MAX_CALLBACK_BYTES: usize = 64;

/// Errors from decoding a callback payload.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CallbackParseError {
    #[error("Unknown callback tag: {0}")]
    UnknownTag(String),

    #[error("Callback '{tag}' expects {expected} fields, got {got}")]
    FieldCount {
        tag: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Invalid index: {0}")]
    InvalidIndex(String),

    #[error("Unknown mode: {0}")]
    UnknownMode(String),

    #[error("Empty key")]
    EmptyKey,
}

/// Mode chosen before acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreMode {
    /// Send every acquired file with this mode.
    Deliver(DeliveryMode),
    /// Build an index and browse it.
    Index,
}

impl PreMode {
    const INDEX_CODE: &'static str = "idx";

    pub fn code(&self) -> &'static str {
        match self {
            Self::Deliver(mode) => mode.code(),
            Self::Index => Self::INDEX_CODE,
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        if code == Self::INDEX_CODE {
            Some(Self::Index)
        } else {
            DeliveryMode::from_code(code).map(Self::Deliver)
        }
    }
}

/// A decoded callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    /// `pre:<job>:<mode>`
    Pre { job: String, mode: PreMode },
    /// `jl:<job>:<page>`
    Groups { job: String, page: usize },
    /// `jg:<job>:<group>:<page>`
    Group {
        job: String,
        group: usize,
        page: usize,
    },
    /// `jp:<job>:<group>:<post>`
    Post {
        job: String,
        group: usize,
        post: usize,
    },
    /// `va:<token>:<mode>`
    Item { token: String, mode: DeliveryMode },
    /// `ag:<job>:<group>:<mode>`
    SendGroup {
        job: String,
        group: usize,
        mode: DeliveryMode,
    },
    /// `ap:<job>:<group>:<post>:<mode>`
    SendPost {
        job: String,
        group: usize,
        post: usize,
        mode: DeliveryMode,
    },
    /// `clg:<job>:<group>`
    CleanGroup { job: String, group: usize },
}

type Parser = fn(&[&str]) -> Result<Callback, CallbackParseError>;

/// Tag → parser table.
const PARSERS: &[(&str, Parser)] = &[
    ("pre", parse_pre),
    ("jl", parse_groups),
    ("jg", parse_group),
    ("jp", parse_post),
    ("va", parse_item),
    ("ag", parse_send_group),
    ("ap", parse_send_post),
    ("clg", parse_clean_group),
];

fn expect(tag: &'static str, fields: &[&str], expected: usize) -> Result<(), CallbackParseError> {
    if fields.len() == expected {
        Ok(())
    } else {
        Err(CallbackParseError::FieldCount {
            tag,
            expected,
            got: fields.len(),
        })
    }
}

fn key(field: &str) -> Result<String, CallbackParseError> {
    if field.is_empty() {
        Err(CallbackParseError::EmptyKey)
    } else {
        Ok(field.to_string())
    }
}

fn index(field: &str) -> Result<usize, CallbackParseError> {
    field
        .parse()
        .map_err(|_| CallbackParseError::InvalidIndex(field.to_string()))
}

fn mode(field: &str) -> Result<DeliveryMode, CallbackParseError> {
    DeliveryMode::from_code(field).ok_or_else(|| CallbackParseError::UnknownMode(field.to_string()))
}

fn parse_pre(f: &[&str]) -> Result<Callback, CallbackParseError> {
    expect("pre", f, 2)?;
    Ok(Callback::Pre {
        job: key(f[0])?,
        mode: PreMode::from_code(f[1]).ok_or_else(|| CallbackParseError::UnknownMode(f[1].to_string()))?,
    })
}

fn parse_groups(f: &[&str]) -> Result<Callback, CallbackParseError> {
    expect("jl", f, 2)?;
    Ok(Callback::Groups {
        job: key(f[0])?,
        page: index(f[1])?,
    })
}

fn parse_group(f: &[&str]) -> Result<Callback, CallbackParseError> {
    expect("jg", f, 3)?;
    Ok(Callback::Group {
        job: key(f[0])?,
        group: index(f[1])?,
        page: index(f[2])?,
    })
}

fn parse_post(f: &[&str]) -> Result<Callback, CallbackParseError> {
    expect("jp", f, 3)?;
    Ok(Callback::Post {
        job: key(f[0])?,
        group: index(f[1])?,
        post: index(f[2])?,
    })
}

fn parse_item(f: &[&str]) -> Result<Callback, CallbackParseError> {
    expect("va", f, 2)?;
    Ok(Callback::Item {
        token: key(f[0])?,
        mode: mode(f[1])?,
    })
}

fn parse_send_group(f: &[&str]) -> Result<Callback, CallbackParseError> {
    expect("ag", f, 3)?;
    Ok(Callback::SendGroup {
        job: key(f[0])?,
        group: index(f[1])?,
        mode: mode(f[2])?,
    })
}

fn parse_send_post(f: &[&str]) -> Result<Callback, CallbackParseError> {
    expect("ap", f, 4)?;
    Ok(Callback::SendPost {
        job: key(f[0])?,
        group: index(f[1])?,
        post: index(f[2])?,
        mode: mode(f[3])?,
    })
}

fn parse_clean_group(f: &[&str]) -> Result<Callback, CallbackParseError> {
    expect("clg", f, 2)?;
    Ok(Callback::CleanGroup {
        job: key(f[0])?,
        group: index(f[1])?,
    })
}

impl Callback {
    /// Decodes a payload.
    pub fn parse(data: &str) -> Result<Self, CallbackParseError> {
        let mut fields = data.split(':');
        let tag = fields.next().unwrap_or_default();
        let rest: Vec<&str> = fields.collect();

        let (_, parser) = PARSERS
            .iter()
            .find(|(t, _)| *t == tag)
            .ok_or_else(|| CallbackParseError::UnknownTag(tag.to_string()))?;
        parser(&rest)
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Pre { .. } => "pre",
            Self::Groups { .. } => "jl",
            Self::Group { .. } => "jg",
            Self::Post { .. } => "jp",
            Self::Item { .. } => "va",
            Self::SendGroup { .. } => "ag",
            Self::SendPost { .. } => "ap",
            Self::CleanGroup { .. } => "clg",
        }
    }

    /// Encodes into the payload format.
    pub fn encode(&self) -> String {
        let tag = self.tag();
        match self {
            Self::Pre { job, mode } => format!("{}:{}:{}", tag, job, mode.code()),
            Self::Groups { job, page } => format!("{}:{}:{}", tag, job, page),
            Self::Group { job, group, page } => format!("{}:{}:{}:{}", tag, job, group, page),
            Self::Post { job, group, post } => format!("{}:{}:{}:{}", tag, job, group, post),
            Self::Item { token, mode } => format!("{}:{}:{}", tag, token, mode.code()),
            Self::SendGroup { job, group, mode } => {
                format!("{}:{}:{}:{}", tag, job, group, mode.code())
            }
            Self::SendPost {
                job,
                group,
                post,
                mode,
            } => format!("{}:{}:{}:{}:{}", tag, job, group, post, mode.code()),
            Self::CleanGroup { job, group } => format!("{}:{}:{}", tag, job, group),
        }
    }
}
