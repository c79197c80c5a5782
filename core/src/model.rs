//! Checked views over the NGINX action and condition wire structs.
//!
//! The CRDs model both as structs with several optional fields of which
//! exactly one should be set. Converting into these enums validates that
//! once, so translators can match on a single discriminant.

use itertools::Itertools;
use nic2gw_api::nginx::{Action, ActionProxy, Condition};
use std::fmt::{Display, Formatter};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ActionError {
    #[error("action has none of pass, redirect, return or proxy set")]
    Empty,
    #[error("action sets more than one of {0}")]
    Ambiguous(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RouteAction<'a> {
    Pass(&'a str),
    Redirect { url: &'a str, code: Option<u16> },
    Return { code: Option<u16>, body: &'a str },
    Proxy(&'a ActionProxy),
}

impl<'a> TryFrom<&'a Action> for RouteAction<'a> {
    type Error = ActionError;

    fn try_from(action: &'a Action) -> Result<Self, Self::Error> {
        let mut variants = Vec::with_capacity(1);

        if let Some(pass) = action.pass.as_deref().filter(|p| !p.is_empty()) {
            variants.push(("pass", RouteAction::Pass(pass)));
        }
        if let Some(redirect) = &action.redirect {
            variants.push((
                "redirect",
                RouteAction::Redirect {
                    url: &redirect.url,
                    code: redirect.code,
                },
            ));
        }
        if let Some(ret) = &action.return_ {
            variants.push((
                "return",
                RouteAction::Return {
                    code: ret.code,
                    body: &ret.body,
                },
            ));
        }
        if let Some(proxy) = &action.proxy {
            variants.push(("proxy", RouteAction::Proxy(proxy)));
        }

        match variants.len() {
            0 => Err(ActionError::Empty),
            1 => Ok(variants.remove(0).1),
            _ => Err(ActionError::Ambiguous(
                variants.iter().map(|(name, _)| *name).join(", "),
            )),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConditionError {
    #[error("condition has none of header, argument, cookie or variable set")]
    Empty,
    #[error("condition sets more than one of {0}")]
    Ambiguous(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind<'a> {
    Header(&'a str),
    Argument(&'a str),
    Cookie(&'a str),
    Variable(&'a str),
}

impl ConditionKind<'_> {
    pub fn label(&self) -> &'static str {
        match self {
            ConditionKind::Header(_) => "Header",
            ConditionKind::Argument(_) => "Query parameter",
            ConditionKind::Cookie(_) => "Cookie",
            ConditionKind::Variable(_) => "Variable",
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ConditionKind::Header(name)
            | ConditionKind::Argument(name)
            | ConditionKind::Cookie(name)
            | ConditionKind::Variable(name) => name,
        }
    }
}

impl Display for ConditionKind<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} '{}'", self.label(), self.name())
    }
}

/// A condition value with the leading `!` negation marker split off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionValue<'a> {
    pub pattern: &'a str,
    pub negated: bool,
}

impl<'a> ConditionValue<'a> {
    /// True only for an empty raw value; a bare `!` negates the empty string.
    pub fn is_blank(&self) -> bool {
        self.pattern.is_empty() && !self.negated
    }

    pub fn parse(raw: &'a str) -> Self {
        match raw.strip_prefix('!') {
            Some(pattern) => Self {
                pattern,
                negated: true,
            },
            None => Self {
                pattern: raw,
                negated: false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchCondition<'a> {
    pub kind: ConditionKind<'a>,
    pub value: ConditionValue<'a>,
}

impl<'a> TryFrom<&'a Condition> for MatchCondition<'a> {
    type Error = ConditionError;

    fn try_from(condition: &'a Condition) -> Result<Self, Self::Error> {
        let populated = |field: &'a Option<String>| field.as_deref().filter(|v| !v.is_empty());

        let kinds = [
            ("header", populated(&condition.header).map(ConditionKind::Header)),
            ("argument", populated(&condition.argument).map(ConditionKind::Argument)),
            ("cookie", populated(&condition.cookie).map(ConditionKind::Cookie)),
            ("variable", populated(&condition.variable).map(ConditionKind::Variable)),
        ]
        .into_iter()
        .filter_map(|(name, kind)| kind.map(|kind| (name, kind)))
        .collect::<Vec<_>>();

        match kinds.as_slice() {
            [] => Err(ConditionError::Empty),
            [(_, kind)] => Ok(Self {
                kind: *kind,
                value: ConditionValue::parse(&condition.value),
            }),
            _ => Err(ConditionError::Ambiguous(
                kinds.iter().map(|(name, _)| *name).join(", "),
            )),
        }
    }
}
