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

//! Collect `tracing` spans and events as JSON values, to assert on the diagnostics a piece of code
//! emits.

mod assertions;
mod collect;
mod layer;

pub use assertions::{assert_events, assert_trace};
pub use collect::{collect, strip_ids_and_target};
pub use layer::JsonLayer;

use serde_json as json;
use std::sync::{Arc, RwLock};

/// A shared, append-only buffer of JSON traces.
#[repr(transparent)]
#[derive(Clone, Default)]
pub struct JsonTraceCollector(Arc<RwLock<Vec<json::Value>>>);

impl JsonTraceCollector {
    fn insert(&self, value: json::Value) {
        if let Ok(mut lines) = self.0.write() {
            lines.push(value);
        }
    }

    /// Take every trace collected so far.
    pub fn flush(&self) -> Vec<json::Value> {
        match self.0.write() {
            Ok(mut traces) => std::mem::take(&mut *traces),
            // Only a panic while pushing a trace can poison the lock; whatever was collected up
            // to that point is still worth returning.
            Err(err) => err.into_inner().clone(),
        }
    }
}

/// Records fields as JSON; dotted field names (`a.b`) become nested objects.
#[derive(Default)]
struct JsonVisitor {
    fields: json::Map<String, json::Value>,
}

impl JsonVisitor {
    fn add_field(&mut self, path: &str, value: json::Value) {
        let mut steps = path.split('.').peekable();
        let mut fields = &mut self.fields;

        while let Some(step) = steps.next() {
            if steps.peek().is_none() {
                fields.insert(step.to_string(), value);
                return;
            }

            let entry = fields
                .entry(step.to_string())
                .or_insert_with(|| json::json!({}));
            if !entry.is_object() {
                *entry = json::json!({});
            }

            fields = match entry.as_object_mut() {
                Some(object) => object,
                None => return,
            };
        }
    }
}

macro_rules! record_t {
    ($title:ident, $ty:ty) => {
        fn $title(&mut self, field: &tracing::field::Field, value: $ty) {
            self.add_field(field.name(), json::json!(value));
        }
    };
}

impl tracing::field::Visit for JsonVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.add_field(field.name(), json::json!(format!("{:?}", value)))
    }

    record_t!(record_f64, f64);
    record_t!(record_i64, i64);
    record_t!(record_u64, u64);
    record_t!(record_i128, i128);
    record_t!(record_u128, u128);
    record_t!(record_bool, bool);
    record_t!(record_str, &str);

    fn record_bytes(&mut self, field: &tracing::field::Field, value: &[u8]) {
        self.add_field(field.name(), json::json!(hex::encode(value)));
    }

    fn record_error(
        &mut self,
        field: &tracing::field::Field,
        value: &(dyn std::error::Error + 'static),
    ) {
        self.add_field(field.name(), json::json!(value.to_string()))
    }
}
