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

use crate::{JsonLayer, JsonTraceCollector};
use serde_json::Value;
use tracing::Dispatch;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Layer};

/// Run `run` under a dedicated subscriber and return its result along with every span and event
/// emitted under the given target prefixes. Human-readable logs are still printed according to
/// `RUST_LOG`.
pub fn collect<F, R>(run: F, targets: &[&str]) -> (R, Vec<Value>)
where
    F: FnOnce() -> R,
{
    let collector = JsonTraceCollector::default();
    let subscriber = tracing_subscriber::registry()
        .with(JsonLayer::new(collector.clone(), targets))
        .with(
            tracing_subscriber::fmt::Layer::default()
                .with_test_writer()
                .with_filter(EnvFilter::from_default_env()),
        );
    let dispatch = Dispatch::new(subscriber);
    let result = tracing::dispatcher::with_default(&dispatch, run);
    (result, collector.flush())
}

pub fn strip_ids_and_target(mut value: Value) -> Value {
    if let Value::Object(ref mut map) = value {
        map.remove("id");
        map.remove("parent_id");
        map.remove("target");
    }
    value
}
