//! Pace and stroke-rate guidance matchers.
//!
//! Each `@…` token is tried against the matchers in a fixed precedence
//! order; the first that matches decides what the token means.

use crate::lexer::parse_clock_tenths;
use crate::{Guidance, PaceTarget, ReferencePace, TrainingZone};
use once_cell::sync::Lazy;
use regex::Regex;

// Compiled once; `None` only if a pattern below were malformed.
static RATE_RANGE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)^(r)?(\d{1,3})(?:-|\.\.)r?(\d{1,3})(spm)?$").ok());

static RATE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)^(?:r(\d{1,3})|(\d{1,3})spm)$").ok());

static ABS_PACE_RANGE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2}:\d{2}(?:\.\d)?)(?:-|\.\.)(\d{1,2}:\d{2}(?:\.\d)?)$").ok()
});

static REL_PACE_RANGE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"(?i)^((?:2k|5k|6k|30m|60m)(?:[+-]\d+(?:\.\d)?)?)(?:\.\.|-)((?:2k|5k|6k|30m|60m)(?:[+-]\d+(?:\.\d)?)?)$",
    )
    .ok()
});

static REL_PACE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)^(2k|5k|6k|30m|60m)([+-])(\d+(?:\.\d)?)$").ok());

static BARE_REFERENCE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)^(2k|5k|6k|30m|60m)$").ok());

static ZONE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?i)^(UT2|UT1|AT|TR|AN)$").ok());

static ABS_PACE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^(\d{1,2}:\d{2}(?:\.\d)?)$").ok());

/// What a single guidance token resolved to
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuidanceMatch {
    Rate { min: u32, max: Option<u32> },
    Pace { min: PaceTarget, max: Option<PaceTarget> },
}

fn captures<'t>(pattern: &Lazy<Option<Regex>>, text: &'t str) -> Option<regex::Captures<'t>> {
    let regex: &Option<Regex> = pattern;
    regex.as_ref()?.captures(text)
}

/// Resolve a guidance token body (text after `@`)
pub fn match_guidance(text: &str) -> Option<GuidanceMatch> {
    let text = text.trim();

    if let Some(caps) = captures(&RATE_RANGE, text) {
        // Either the `r` prefix or the `spm` suffix must mark it as a rate
        if caps.get(1).is_some() || caps.get(4).is_some() {
            let min = caps[2].parse().ok()?;
            let max = caps[3].parse().ok()?;
            return Some(GuidanceMatch::Rate {
                min,
                max: Some(max),
            });
        }
    }

    if let Some(caps) = captures(&RATE, text) {
        let value = caps.get(1).or_else(|| caps.get(2))?.as_str().parse().ok()?;
        return Some(GuidanceMatch::Rate {
            min: value,
            max: None,
        });
    }

    if let Some(caps) = captures(&ABS_PACE_RANGE, text) {
        let min = parse_clock_tenths(&caps[1])?;
        let max = parse_clock_tenths(&caps[2])?;
        return Some(GuidanceMatch::Pace {
            min: PaceTarget::Absolute { tenths: min },
            max: Some(PaceTarget::Absolute { tenths: max }),
        });
    }

    if let Some(caps) = captures(&REL_PACE_RANGE, text) {
        let min = parse_relative(&caps[1])?;
        let max = parse_relative(&caps[2])?;
        return Some(GuidanceMatch::Pace {
            min,
            max: Some(max),
        });
    }

    if let Some(pace) = parse_relative(text) {
        return Some(GuidanceMatch::Pace {
            min: pace,
            max: None,
        });
    }

    if let Some(zone) = captures(&ZONE, text).and_then(|c| TrainingZone::from_token(&c[1])) {
        return Some(GuidanceMatch::Pace {
            min: PaceTarget::Zone(zone),
            max: None,
        });
    }

    if let Some(caps) = captures(&ABS_PACE, text) {
        let tenths = parse_clock_tenths(&caps[1])?;
        return Some(GuidanceMatch::Pace {
            min: PaceTarget::Absolute { tenths },
            max: None,
        });
    }

    None
}

/// Relative pace with offset, or a bare reference
fn parse_relative(text: &str) -> Option<PaceTarget> {
    if let Some(caps) = captures(&REL_PACE, text) {
        let reference = ReferencePace::from_token(&caps[1])?;
        let magnitude = parse_offset_tenths(&caps[3])?;
        let offset_tenths = if &caps[2] == "-" { -magnitude } else { magnitude };
        return Some(PaceTarget::Relative {
            reference,
            offset_tenths,
        });
    }

    let caps = captures(&BARE_REFERENCE, text)?;
    Some(PaceTarget::Relative {
        reference: ReferencePace::from_token(&caps[1])?,
        offset_tenths: 0,
    })
}

fn parse_offset_tenths(text: &str) -> Option<i32> {
    let (whole, fraction) = match text.split_once('.') {
        Some((w, f)) => (w, f.parse::<i32>().ok()?),
        None => (text, 0),
    };
    whole.parse::<i32>().ok()?.checked_mul(10)?.checked_add(fraction)
}

/// Parse a single pace target as written in notation (`2:05`, `2k+10`, `UT1`)
pub fn parse_pace_target(text: &str) -> Option<PaceTarget> {
    match match_guidance(text)? {
        GuidanceMatch::Pace { min, max: None } => Some(min),
        _ => None,
    }
}

/// Merge a matched token into step guidance; the first value for a field wins.
pub fn apply_match(guidance: &mut Guidance, matched: GuidanceMatch) {
    match matched {
        GuidanceMatch::Rate { min, max } => {
            if guidance.rate.is_none() {
                guidance.rate = Some(min);
                guidance.rate_max = max;
            }
        }
        GuidanceMatch::Pace { min, max } => {
            if guidance.pace.is_none() {
                guidance.pace = Some(min);
                guidance.pace_max = max;
            }
        }
    }
}

/// Render guidance back to notation (`@2:05@24spm`)
pub fn render(guidance: &Guidance) -> String {
    let mut out = String::new();

    if let Some(pace) = &guidance.pace {
        out.push('@');
        out.push_str(&pace.to_string());
        if let Some(max) = &guidance.pace_max {
            // Relative offsets already use '-', so relative ranges use '..'
            let separator = if pace.is_relative() || max.is_relative() { ".." } else { "-" };
            out.push_str(separator);
            out.push_str(&max.to_string());
        }
    }

    if let Some(rate) = guidance.rate {
        match guidance.rate_max {
            Some(max) => out.push_str(&format!("@{}-{}spm", rate, max)),
            None => out.push_str(&format!("@{}spm", rate)),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(reference: ReferencePace, offset_tenths: i32) -> PaceTarget {
        PaceTarget::Relative {
            reference,
            offset_tenths,
        }
    }

    #[test]
    fn test_rate_forms() {
        assert_eq!(
            match_guidance("r20"),
            Some(GuidanceMatch::Rate { min: 20, max: None })
        );
        assert_eq!(
            match_guidance("32spm"),
            Some(GuidanceMatch::Rate { min: 32, max: None })
        );
        assert_eq!(
            match_guidance("18-22spm"),
            Some(GuidanceMatch::Rate {
                min: 18,
                max: Some(22)
            })
        );
        assert_eq!(
            match_guidance("18..22spm"),
            Some(GuidanceMatch::Rate {
                min: 18,
                max: Some(22)
            })
        );
        assert_eq!(
            match_guidance("r18-22"),
            Some(GuidanceMatch::Rate {
                min: 18,
                max: Some(22)
            })
        );
    }

    #[test]
    fn test_pace_forms() {
        assert_eq!(
            match_guidance("2:05"),
            Some(GuidanceMatch::Pace {
                min: PaceTarget::Absolute { tenths: 1250 },
                max: None
            })
        );
        assert_eq!(
            match_guidance("2:05-2:10"),
            Some(GuidanceMatch::Pace {
                min: PaceTarget::Absolute { tenths: 1250 },
                max: Some(PaceTarget::Absolute { tenths: 1300 })
            })
        );
        assert_eq!(
            match_guidance("2k+18"),
            Some(GuidanceMatch::Pace {
                min: rel(ReferencePace::TwoK, 180),
                max: None
            })
        );
        assert_eq!(
            match_guidance("6k-2"),
            Some(GuidanceMatch::Pace {
                min: rel(ReferencePace::SixK, -20),
                max: None
            })
        );
        assert_eq!(
            match_guidance("30m"),
            Some(GuidanceMatch::Pace {
                min: rel(ReferencePace::ThirtyMinute, 0),
                max: None
            })
        );
        assert_eq!(
            match_guidance("2k+5..2k+10"),
            Some(GuidanceMatch::Pace {
                min: rel(ReferencePace::TwoK, 50),
                max: Some(rel(ReferencePace::TwoK, 100))
            })
        );
        assert_eq!(
            match_guidance("ut2"),
            Some(GuidanceMatch::Pace {
                min: PaceTarget::Zone(TrainingZone::Ut2),
                max: None
            })
        );
    }

    #[test]
    fn test_unrecognized_guidance() {
        assert_eq!(match_guidance("fast"), None);
        assert_eq!(match_guidance("20"), None);
        assert_eq!(match_guidance(""), None);
        assert_eq!(match_guidance("3k"), None);
    }

    #[test]
    fn test_first_match_wins() {
        let mut guidance = Guidance::default();
        apply_match(&mut guidance, match_guidance("2k").unwrap());
        apply_match(&mut guidance, match_guidance("32spm").unwrap());
        apply_match(&mut guidance, match_guidance("1:50").unwrap());
        apply_match(&mut guidance, match_guidance("r20").unwrap());

        assert_eq!(guidance.pace, Some(rel(ReferencePace::TwoK, 0)));
        assert_eq!(guidance.rate, Some(32));
    }

    #[test]
    fn test_render_guidance() {
        let guidance = Guidance {
            pace: Some(PaceTarget::Absolute { tenths: 1250 }),
            pace_max: Some(PaceTarget::Absolute { tenths: 1300 }),
            rate: Some(18),
            rate_max: Some(22),
        };
        assert_eq!(render(&guidance), "@2:05-2:10@18-22spm");

        let relative = Guidance {
            pace: Some(rel(ReferencePace::TwoK, 50)),
            pace_max: Some(rel(ReferencePace::TwoK, 100)),
            ..Guidance::default()
        };
        assert_eq!(render(&relative), "@2k+5..2k+10");
    }
}
