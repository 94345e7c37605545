// Copyright 2025 Accrual Maintainers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::collect::{collect, strip_ids_and_target};
use assert_json_diff::assert_json_eq;
use serde_json::Value;

/// Assert that running `run` emits exactly the `expected` spans and events, in order. Ids and
/// targets are ignored.
pub fn assert_trace<F, R>(run: F, expected: Vec<Value>) -> R
where
    F: FnOnce() -> R,
{
    let (result, collected) = collect(run, &[]);
    let collected: Vec<_> = collected.into_iter().map(strip_ids_and_target).collect();

    if collected != expected {
        eprintln!(
            "collected traces:\n  - {}",
            collected
                .iter()
                .map(serde_json::to_string)
                .collect::<Result<Vec<_>, _>>()
                .map(|vec| vec.join("\n  - "))
                .unwrap_or_else(|e| format!("error: invalid JSON traces: {e}"))
        )
    }

    assert_json_eq!(Value::Array(collected), Value::Array(expected));
    result
}

/// Assert that running `run` emits exactly the `expected` events under `target`, in order; spans
/// are ignored, and so are ids, targets and event types.
pub fn assert_events<F, R>(run: F, target: &str, expected: Vec<Value>) -> R
where
    F: FnOnce() -> R,
{
    let (result, collected) = collect(run, &[target]);
    let events: Vec<_> = collected
        .into_iter()
        .filter(|trace| trace.get("type").and_then(Value::as_str) == Some("event"))
        .map(|trace| {
            let mut trace = strip_ids_and_target(trace);
            if let Value::Object(ref mut map) = trace {
                map.remove("type");
            }
            trace
        })
        .collect();

    assert_json_eq!(Value::Array(events), Value::Array(expected));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tracing::{debug, info, info_span, warn};

    #[test]
    fn check_simple_tracing() {
        assert_eq!(
            assert_trace(
                || {
                    info_span!("foo").in_scope(|| {
                        info!(a = 1, "basic");
                        info!(a.foo = 1, a.bar = 2, "nested_fields");
                        "result"
                    })
                },
                vec![
                    json!({ "name": "foo", "type": "span", "level": "INFO" }),
                    json!({ "name": "basic", "a": 1, "type": "event", "level": "INFO" }),
                    json!({
                        "name": "nested_fields",
                        "a": { "foo": 1, "bar": 2 },
                        "level": "INFO",
                        "type": "event"
                    }),
                ],
            ),
            "result"
        );
    }

    #[test]
    fn check_events_of_a_target() {
        assert_events(
            || {
                info_span!(target: "accrual::test", "outer").in_scope(|| {
                    debug!(target: "accrual::test::inner", amount = %"10.7", "kept");
                    warn!(target: "elsewhere", "dropped");
                })
            },
            "accrual::test",
            vec![json!({ "name": "kept", "amount": "10.7", "level": "DEBUG" })],
        )
    }

    #[test]
    #[should_panic]
    fn check_events_mismatch() {
        assert_events(
            || info!(target: "accrual::test", "actual"),
            "accrual::test",
            vec![json!({ "name": "expected", "level": "INFO" })],
        )
    }
}
