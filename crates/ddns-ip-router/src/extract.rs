// # Line Extractor
//
// Locates the external address in a router page with the search/skip/match
// protocol:
//
// 1. Find the first line containing `search`
// 2. Move `skip + 1` lines further down (skip = 0 is the very next line)
// 3. Match the pattern at the start of that line and return capture group 1
//
// The scan is a single forward pass. Once `search` has been seen, later
// occurrences do not restart the countdown.

use ddns_core::config::FetchSpec;
use ddns_core::{Error, NotFound, Result};
use regex::Regex;

/// Search/skip/match scanner for router pages
#[derive(Debug, Clone)]
pub struct LineExtractor {
    search: String,
    skip: usize,
    /// The configured pattern as written, for diagnostics
    pattern_source: String,
    pattern: Regex,
}

impl LineExtractor {
    /// Build an extractor, compiling `match_pattern`
    pub fn new(search: impl Into<String>, skip: usize, match_pattern: &str) -> Result<Self> {
        let search = search.into();
        if search.is_empty() {
            return Err(Error::config("Search string cannot be empty"));
        }

        let pattern = Regex::new(match_pattern).map_err(|e| {
            Error::config(format!(
                "Invalid match pattern {:?}: {}",
                match_pattern, e
            ))
        })?;

        Ok(Self {
            search,
            skip,
            pattern_source: match_pattern.to_string(),
            pattern,
        })
    }

    /// Build an extractor from the fetch configuration
    pub fn from_spec(spec: &FetchSpec) -> Result<Self> {
        Self::new(spec.search.clone(), spec.skip, &spec.match_pattern)
    }

    /// Scan `body` and return the captured address
    pub fn extract(&self, body: &str) -> std::result::Result<String, NotFound> {
        // Lines still to pass before the target; None until `search` is seen
        let mut remaining: Option<usize> = None;

        for line in body.lines() {
            match remaining {
                Some(0) => return self.match_line(line),
                Some(n) => remaining = Some(n - 1),
                None => {
                    if line.contains(&self.search) {
                        remaining = Some(self.skip);
                    }
                }
            }
        }

        let err = match remaining {
            None => NotFound::SearchNotFound {
                search: self.search.clone(),
            },
            Some(_) => NotFound::TargetPastEnd {
                search: self.search.clone(),
                skip: self.skip,
            },
        };
        tracing::debug!("{}", err);
        Err(err)
    }

    fn match_line(&self, line: &str) -> std::result::Result<String, NotFound> {
        let no_match = || NotFound::NoMatch {
            search: self.search.clone(),
            skip: self.skip,
        };

        // Leftmost-first search: if any match starts at column 0, the
        // reported one does, so this behaves like an anchored match
        let anchored = self
            .pattern
            .captures(line)
            .filter(|captures| captures.get(0).is_some_and(|m| m.start() == 0));

        let Some(captures) = anchored else {
            let err = no_match();
            tracing::debug!("{} (line was {:?})", err, line);
            return Err(err);
        };

        // Group 0 is the whole match
        if captures.len() < 2 {
            let err = NotFound::NoCaptureGroup {
                pattern: self.pattern_source.clone(),
            };
            tracing::debug!("{}", err);
            return Err(err);
        }

        match captures.get(1) {
            Some(group) => Ok(group.as_str().to_string()),
            None => {
                let err = no_match();
                tracing::debug!("{} (capture group did not participate)", err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT_MATCH: &str = r".*<td>([0-9.]+)";

    fn extractor(search: &str, skip: usize, pattern: &str) -> LineExtractor {
        LineExtractor::new(search, skip, pattern).unwrap()
    }

    #[test]
    fn test_skip_zero_targets_next_line() {
        let page = "<tr><td>IP Address</td>\n<td>203.0.113.7</td></tr>";
        let ip = extractor("IP Address", 0, DEFAULT_MATCH).extract(page).unwrap();
        assert_eq!(ip, "203.0.113.7");
    }

    #[test]
    fn test_skip_counts_lines_after_search() {
        let page = "\
WAN status
IP Address
<td>10.0.0.1</td>
<td>10.0.0.2</td>
<td>10.0.0.3</td>";

        assert_eq!(
            extractor("IP Address", 1, DEFAULT_MATCH).extract(page).unwrap(),
            "10.0.0.2"
        );
        assert_eq!(
            extractor("IP Address", 2, DEFAULT_MATCH).extract(page).unwrap(),
            "10.0.0.3"
        );
    }

    #[test]
    fn test_later_search_occurrences_do_not_reset_countdown() {
        let page = "\
IP Address (WAN)
IP Address (LAN)
<td>198.51.100.1</td>";

        // Countdown started on the first line: the target is the second line,
        // which does not match
        let err = extractor("IP Address", 0, DEFAULT_MATCH)
            .extract(page)
            .unwrap_err();
        assert_eq!(
            err,
            NotFound::NoMatch {
                search: "IP Address".to_string(),
                skip: 0
            }
        );

        // With skip = 1 the third line is reached
        assert_eq!(
            extractor("IP Address", 1, DEFAULT_MATCH).extract(page).unwrap(),
            "198.51.100.1"
        );
    }

    #[test]
    fn test_match_is_anchored_at_line_start() {
        let page = "IP Address\nvalue: 1.2.3.4";

        let err = extractor("IP Address", 0, r"([0-9.]+)")
            .extract(page)
            .unwrap_err();
        assert!(matches!(err, NotFound::NoMatch { .. }));

        assert_eq!(
            extractor("IP Address", 0, r"value: ([0-9.]+)")
                .extract(page)
                .unwrap(),
            "1.2.3.4"
        );
    }

    #[test]
    fn test_verbose_pattern_with_trailing_comment() {
        let pattern = r"(?x) .*<td> ([0-9.]+)  # address cell";
        let page = "IP Address\n<td>203.0.113.9</td>";

        assert_eq!(
            extractor("IP Address", 0, pattern).extract(page).unwrap(),
            "203.0.113.9"
        );
    }

    #[test]
    fn test_leading_text_is_not_skipped() {
        // A match later in the line must not stand in for one at the start
        let page = "IP Address\nWAN <td>192.0.2.1</td>";

        let err = extractor("IP Address", 0, r"<td>([0-9.]+)")
            .extract(page)
            .unwrap_err();
        assert!(matches!(err, NotFound::NoMatch { .. }));
    }

    #[test]
    fn test_match_need_not_span_the_whole_line() {
        let page = "IP Address\n<td>192.0.2.44</td> trailing text";
        assert_eq!(
            extractor("IP Address", 0, DEFAULT_MATCH).extract(page).unwrap(),
            "192.0.2.44"
        );
    }

    #[test]
    fn test_search_not_found() {
        let err = extractor("IP Address", 0, DEFAULT_MATCH)
            .extract("nothing\nto see\nhere")
            .unwrap_err();
        assert_eq!(
            err,
            NotFound::SearchNotFound {
                search: "IP Address".to_string()
            }
        );
    }

    #[test]
    fn test_target_past_end() {
        let err = extractor("IP Address", 3, DEFAULT_MATCH)
            .extract("IP Address\n<td>1.2.3.4</td>")
            .unwrap_err();
        assert_eq!(
            err,
            NotFound::TargetPastEnd {
                search: "IP Address".to_string(),
                skip: 3
            }
        );
    }

    #[test]
    fn test_search_on_last_line_is_past_end() {
        let err = extractor("IP Address", 0, DEFAULT_MATCH)
            .extract("header\nIP Address")
            .unwrap_err();
        assert!(matches!(err, NotFound::TargetPastEnd { .. }));
    }

    #[test]
    fn test_pattern_without_group() {
        let err = extractor("IP Address", 0, r".*<td>[0-9.]+")
            .extract("IP Address\n<td>1.2.3.4</td>")
            .unwrap_err();
        assert_eq!(
            err,
            NotFound::NoCaptureGroup {
                pattern: r".*<td>[0-9.]+".to_string()
            }
        );
    }

    #[test]
    fn test_unset_optional_group_is_no_match() {
        let err = extractor("IP Address", 0, r"<td>(?:([0-9.]+)|n/a)")
            .extract("IP Address\n<td>n/a</td>")
            .unwrap_err();
        assert!(matches!(err, NotFound::NoMatch { .. }));
    }

    #[test]
    fn test_crlf_lines() {
        let page = "IP Address\r\n<td>10.1.2.3</td>\r\n";
        assert_eq!(
            extractor("IP Address", 0, DEFAULT_MATCH).extract(page).unwrap(),
            "10.1.2.3"
        );
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let result = LineExtractor::new("IP Address", 0, "([0-9.]+");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_empty_search_rejected() {
        assert!(LineExtractor::new("", 0, DEFAULT_MATCH).is_err());
    }
}
