//! Job execution: read test cases, dispatch, stream replies
//!
//! A job file is a JSON object, either `{"testcases": {id: case, …}}` or a
//! bare `{id: case, …}` map. Replies are emitted one JSON object per line
//! in the order the cases appear in the file (`serde_json` is built with
//! `preserve_order`, so object iteration follows the file). A failing case
//! produces an error reply; only a malformed job file fails the run.

pub mod dispatch;
pub mod types;

use std::io::Write;

use serde_json::{json, Value};

use crate::error::{CoreError, CoreResult};
use self::dispatch::dispatch as dispatch_action;
use self::types::TestCase;

/// Runs every test case of a parsed job file, writing one reply line each.
///
/// # Errors
/// `CoreError::Encoding` when the job structure is not an object of test
/// cases, `CoreError::Transport` when writing a reply line fails.
pub fn run(job: &Value, out: &mut dyn Write) -> CoreResult<()> {
    let cases = job.get("testcases").unwrap_or(job);
    let map = cases.as_object().ok_or_else(|| {
        CoreError::Encoding("job file must be an object of test cases".into())
    })?;

    for (id, raw_case) in map {
        let reply = match serde_json::from_value::<TestCase>(raw_case.clone()) {
            Ok(case) => dispatch_action(&case.action, &case.arguments),
            Err(e) => json!({ "error": format!("malformed test case: {}", e) }),
        };
        let line = json!({ "id": id, "reply": reply });
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_to_lines(job: Value) -> Vec<Value> {
        let mut out = Vec::new();
        run(&job, &mut out).unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_replies_follow_file_order() {
        let job = json!({
            "testcases": {
                "case-b": { "action": "calc", "arguments": { "lhs": 2, "rhs": 3, "op": "*" } },
                "case-a": { "action": "calc", "arguments": { "lhs": 10, "rhs": 4, "op": "-" } },
            }
        });
        let lines = run_to_lines(job);
        assert_eq!(lines[0]["id"], "case-b");
        assert_eq!(lines[0]["reply"]["answer"], 6);
        assert_eq!(lines[1]["id"], "case-a");
        assert_eq!(lines[1]["reply"]["answer"], 6);
    }

    #[test]
    fn test_bare_map_without_testcases_wrapper() {
        let job = json!({
            "only": { "action": "calc", "arguments": { "lhs": -7, "rhs": 2, "op": "/" } }
        });
        let lines = run_to_lines(job);
        // truncation toward zero
        assert_eq!(lines[0]["reply"]["answer"], -3);
    }

    #[test]
    fn test_failing_case_keeps_job_running() {
        let job = json!({
            "bad": { "action": "gfinv", "arguments": { "x": "AAAAAAAAAAAAAAAAAAAAAA==" } },
            "good": { "action": "calc", "arguments": { "lhs": 1, "rhs": 1, "op": "+" } },
        });
        let lines = run_to_lines(job);
        assert!(lines[0]["reply"]["error"].is_string());
        assert_eq!(lines[1]["reply"]["answer"], 2);
    }

    #[test]
    fn test_unknown_action_is_error_reply() {
        let job = json!({
            "x": { "action": "does_not_exist", "arguments": {} }
        });
        let lines = run_to_lines(job);
        assert!(lines[0]["reply"]["error"]
            .as_str()
            .unwrap()
            .contains("unknown action"));
    }

    #[test]
    fn test_non_object_job_fails() {
        let mut out = Vec::new();
        assert!(run(&json!([1, 2, 3]), &mut out).is_err());
    }
}
