use crate::model::{ConditionKind, ConditionValue, MatchCondition};
use crate::notifications::Notifications;
use crate::objects::ObjectRef;
use gateway_api::apis::standard::httproutes::{
    HTTPRouteRulesMatchesHeaders, HTTPRouteRulesMatchesHeadersType,
    HTTPRouteRulesMatchesQueryParams, HTTPRouteRulesMatchesQueryParamsType,
};
use nic2gw_api::nginx::Condition;

const REGEX_METACHARACTERS: &[char] = &[
    '*', '^', '$', '[', ']', '(', ')', '.', '+', '?', '|', '\\',
];

const COOKIE_HEADER: &str = "Cookie";

/// Header and query predicates produced for one NGINX match.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MatchPredicates {
    pub headers: Vec<HTTPRouteRulesMatchesHeaders>,
    pub query_params: Vec<HTTPRouteRulesMatchesQueryParams>,
}

impl MatchPredicates {
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.query_params.is_empty()
    }
}

pub fn is_regex(value: &str) -> bool {
    value.contains(REGEX_METACHARACTERS)
}

/// Anchored, case-insensitive exact match on a literal value.
pub fn exact_pattern(value: &str) -> String {
    format!("(?i)^{}$", regex::escape(value))
}

pub fn negate(pattern: &str) -> String {
    format!("^(?!{pattern}).*$")
}

fn value_pattern(value: ConditionValue<'_>) -> String {
    let pattern = if is_regex(value.pattern) {
        value.pattern.to_string()
    } else {
        exact_pattern(value.pattern)
    };

    if value.negated {
        negate(&pattern)
    } else {
        pattern
    }
}

/// The Cookie header carries every `name=value` pair, so the pattern only
/// anchors on word boundaries around the pair.
fn cookie_pattern(name: &str, value: ConditionValue<'_>) -> String {
    let inner = if is_regex(value.pattern) {
        format!("{}={}", regex::escape(name), value.pattern)
    } else {
        format!(r"\b{}\b", regex::escape(&format!("{name}={}", value.pattern)))
    };

    if value.negated {
        format!("^(?!.*{inner}).*$")
    } else {
        format!("(?i).*{inner}.*")
    }
}

fn regex_header(name: &str, value: String) -> HTTPRouteRulesMatchesHeaders {
    HTTPRouteRulesMatchesHeaders {
        name: name.to_string(),
        r#type: Some(HTTPRouteRulesMatchesHeadersType::RegularExpression),
        value,
    }
}

pub fn translate_conditions(
    conditions: &[Condition],
    source: &ObjectRef,
    notifications: &mut Notifications,
) -> MatchPredicates {
    let mut predicates = MatchPredicates::default();

    for condition in conditions {
        let condition = match MatchCondition::try_from(condition) {
            Ok(condition) => condition,
            Err(error) => {
                notifications.warning(source, format!("Skipping match condition: {error}"));
                continue;
            }
        };

        if condition.value.is_blank() && !matches!(condition.kind, ConditionKind::Variable(_)) {
            notifications.warning(
                source,
                format!("{} condition missing name or value", condition.kind.label()),
            );
            continue;
        }

        if condition.value.negated && !matches!(condition.kind, ConditionKind::Variable(_)) {
            notifications.info(
                source,
                format!(
                    "Negated {} condition converted to a negative lookahead regex, \
                     which not every Gateway API implementation supports",
                    condition.kind
                ),
            );
        }

        match condition.kind {
            ConditionKind::Header(name) => {
                predicates
                    .headers
                    .push(regex_header(name, value_pattern(condition.value)));
            }
            ConditionKind::Argument(name) => {
                predicates.query_params.push(HTTPRouteRulesMatchesQueryParams {
                    name: name.to_string(),
                    r#type: Some(HTTPRouteRulesMatchesQueryParamsType::RegularExpression),
                    value: value_pattern(condition.value),
                });
            }
            ConditionKind::Cookie(name) => {
                predicates
                    .headers
                    .push(regex_header(COOKIE_HEADER, cookie_pattern(name, condition.value)));
                notifications.info(
                    source,
                    format!("Cookie condition '{name}' converted to Cookie header match"),
                );
            }
            ConditionKind::Variable(name) => {
                notifications.info(
                    source,
                    format!(
                        "NGINX variable condition '{name}' is not directly supported in Gateway API"
                    ),
                );
            }
        }
    }

    predicates
}
