//! Best-effort matching of addresses against rule expressions.
//!
//! Extracts the literal operands that Cloud Armor expressions compare
//! `origin.ip` against, without evaluating the expression itself. Everything
//! here fails soft: malformed literals or inputs mean "no match".

use crate::models::{parse_ipv4, Cidr, CloudArmorPolicy, CloudArmorRule, FirewallRule};
use itertools::Itertools;

/// Field the expression language uses for the client address.
const ORIGIN_IP: &str = "origin.ip";

/// Functions taking `(origin.ip, "<range>")`.
const IP_RANGE_FUNCTIONS: [&str; 1] = ["inIpRange"];

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    LParen,
    Comma,
    EqEq,
    Other,
}

/// Split an expression into the tokens the extractor cares about.
///
/// Identifiers keep their dots (`origin.ip` is one token). Strings may use
/// single or double quotes with backslash escapes; an unterminated string is
/// dropped.
fn tokenize(expr: &str) -> Vec<Token> {
    let chars: Vec<char> = expr.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '\'' | '"' => {
                let quote = c;
                let mut literal = String::new();
                let mut j = i + 1;
                let mut closed = false;
                while j < chars.len() {
                    match chars[j] {
                        '\\' if j + 1 < chars.len() => {
                            literal.push(chars[j + 1]);
                            j += 2;
                        }
                        ch if ch == quote => {
                            closed = true;
                            j += 1;
                            break;
                        }
                        ch => {
                            literal.push(ch);
                            j += 1;
                        }
                    }
                }
                if closed {
                    tokens.push(Token::Str(literal));
                }
                i = j;
            }
            c if c.is_alphanumeric() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '.') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '=' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::EqEq);
                i += 2;
            }
            '!' | '<' | '>' | '=' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Other);
                i += 2;
            }
            _ => {
                tokens.push(Token::Other);
                i += 1;
            }
        }
    }

    tokens
}

fn is_origin_ip(token: Option<&Token>) -> bool {
    matches!(token, Some(Token::Ident(name)) if name == ORIGIN_IP)
}

/// Pull out the IP/CIDR literals compared against `origin.ip`.
///
/// Recognizes `inIpRange(origin.ip, "<range>")` and `origin.ip == "<ip>"`.
/// Literals come back in order of appearance with duplicates kept.
///
/// # Examples
/// ```
/// use gcp_network_planner::processing::extract_ip_literals;
/// let expr = r#"inIpRange(origin.ip, "1.2.3.0/24") && origin.ip == "5.6.7.8""#;
/// assert_eq!(extract_ip_literals(expr), ["1.2.3.0/24", "5.6.7.8"]);
/// ```
pub fn extract_ip_literals(expr: &str) -> Vec<String> {
    let tokens = tokenize(expr);
    let mut literals = Vec::new();

    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::Ident(name) if IP_RANGE_FUNCTIONS.contains(&name.as_str()) => {
                if let (Some(Token::LParen), true, Some(Token::Comma), Some(Token::Str(lit))) = (
                    tokens.get(i + 1),
                    is_origin_ip(tokens.get(i + 2)),
                    tokens.get(i + 3),
                    tokens.get(i + 4),
                ) {
                    literals.push(lit.clone());
                }
            }
            Token::Ident(name) if name == ORIGIN_IP => {
                if let (Some(Token::EqEq), Some(Token::Str(lit))) = (tokens.get(i + 1), tokens.get(i + 2)) {
                    literals.push(lit.clone());
                }
            }
            _ => {}
        }
    }

    log::trace!("extract_ip_literals({expr}) = {literals:?}");
    literals
}

/// Decide whether `input` matches an expression for simulation.
///
/// True when `input` appears case-insensitively in the expression text, or
/// when an extracted CIDR literal contains it, or an extracted plain literal
/// equals it exactly.
pub fn matches_input(expr: &str, input: &str) -> bool {
    if expr.to_lowercase().contains(&input.to_lowercase()) {
        return true;
    }

    let address = parse_ipv4(input.trim()).ok();
    extract_ip_literals(expr).iter().any(|literal| {
        if literal.contains('/') {
            match (Cidr::parse(literal.trim()), address) {
                (Ok(cidr), Some(ip)) => cidr.contains(ip),
                (Err(e), _) => {
                    log::debug!("Skipping literal '{literal}': {e}");
                    false
                }
                _ => false,
            }
        } else {
            literal.trim() == input.trim()
        }
    })
}

/// Find the Cloud Armor rule that would handle `input`.
///
/// Rules are tried in ascending priority. A rule without an expression only
/// matches when it is the default rule.
pub fn simulate_policy<'a>(policy: &'a CloudArmorPolicy, input: &str) -> Option<&'a CloudArmorRule> {
    policy
        .rules
        .iter()
        .sorted_by_key(|r| r.priority)
        .find(|rule| match &rule.match_expression {
            Some(expr) => matches_input(expr, input),
            None => rule.is_default(),
        })
}

/// Enabled firewall rules whose source ranges contain `ip`, by priority.
pub fn matching_firewall_rules<'a>(rules: &'a [FirewallRule], ip: &str) -> Vec<&'a FirewallRule> {
    let Ok(address) = parse_ipv4(ip.trim()) else {
        return Vec::new();
    };

    rules
        .iter()
        .filter(|rule| !rule.disabled)
        .filter(|rule| {
            rule.source_ranges.iter().any(|range| {
                let range = range.trim();
                let range = if range.contains('/') {
                    Cidr::parse(range)
                } else {
                    parse_ipv4(range).and_then(|a| Cidr::new(a, 32))
                };
                match range {
                    Ok(cidr) => cidr.contains(address),
                    Err(e) => {
                        log::debug!("Skipping source range in rule '{}': {e}", rule.name);
                        false
                    }
                }
            })
        })
        .sorted_by_key(|rule| rule.priority)
        .collect()
}
