//! Scanner report parsing.

use serde::Deserialize;

use super::ScanError;
use crate::item::Finding;

/// Parse a semgrep JSON report into findings.
///
/// A report without a `results` array has no findings.
pub fn parse_scan_output(json: &str) -> Result<Vec<Finding>, ScanError> {
    let report: RawReport =
        serde_json::from_str(json).map_err(|e| ScanError::ParseError(e.to_string()))?;

    Ok(report
        .results
        .into_iter()
        .map(|result| Finding {
            file_path: result.path,
            check_id: result.check_id,
            start_line: result.start.line,
            end_line: result.end.line,
            vuln_lines: result.extra.lines,
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct RawReport {
    #[serde(default)]
    results: Vec<RawResult>,
}

#[derive(Debug, Deserialize)]
struct RawResult {
    path: String,
    check_id: String,
    start: RawPosition,
    end: RawPosition,
    #[serde(default)]
    extra: RawExtra,
}

#[derive(Debug, Deserialize)]
struct RawPosition {
    line: u32,
}

#[derive(Debug, Default, Deserialize)]
struct RawExtra {
    #[serde(default)]
    lines: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_results() {
        let json = r#"{
            "version": "1.50.0",
            "errors": [],
            "results": [
                {
                    "check_id": "php.lang.security.eval-use.eval-use",
                    "path": "./plugins/foo/foo.php",
                    "start": {"line": 12, "col": 5, "offset": 100},
                    "end": {"line": 14, "col": 2, "offset": 140},
                    "extra": {"lines": "eval($_GET['c']);", "severity": "ERROR"}
                }
            ]
        }"#;

        let findings = parse_scan_output(json).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].check_id, "php.lang.security.eval-use.eval-use");
        assert_eq!(findings[0].file_path, "./plugins/foo/foo.php");
        assert_eq!(findings[0].start_line, 12);
        assert_eq!(findings[0].end_line, 14);
        assert_eq!(findings[0].vuln_lines, "eval($_GET['c']);");
    }

    #[test]
    fn test_missing_results_is_empty() {
        assert!(parse_scan_output(r#"{"errors": []}"#).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_report() {
        assert!(matches!(
            parse_scan_output("{\"results\": [{\"path\": 1}]"),
            Err(ScanError::ParseError(_))
        ));
        assert!(matches!(parse_scan_output(""), Err(ScanError::ParseError(_))));
    }
}
