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

use crate::{JsonTraceCollector, JsonVisitor};
use serde_json::{self as json, Value};

/// A layer pushing spans (on enter) and events into a [`JsonTraceCollector`], restricted to
/// targets starting with one of the given prefixes. No prefix means every target.
pub struct JsonLayer {
    collector: JsonTraceCollector,
    targets: Vec<String>,
}

impl JsonLayer {
    pub fn new(collector: JsonTraceCollector, targets: &[&str]) -> Self {
        Self {
            collector,
            targets: targets.iter().map(|target| target.to_string()).collect(),
        }
    }

    fn has_target(&self, target: &str) -> bool {
        self.targets.is_empty() || self.targets.iter().any(|t| target.starts_with(t.as_str()))
    }
}

impl<S> tracing_subscriber::Layer<S> for JsonLayer
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        if let Some(span) = ctx.span(id) {
            if !self.has_target(span.metadata().target()) {
                return;
            }
            let mut visitor = JsonVisitor::default();
            attrs.record(&mut visitor);
            span.extensions_mut().insert(visitor.fields);
        }
    }

    fn on_enter(&self, id: &tracing::span::Id, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };

        if !self.has_target(span.metadata().target()) {
            return;
        }

        let mut span_json = json::json!({
            "id": Value::String(format!("{id:?}")),
            "name": span.name(),
            "target": span.metadata().target(),
            "type": "span",
            "level": span.metadata().level().to_string(),
        });

        if let Some(parent) = span.parent() {
            span_json["parent_id"] = Value::String(format!("{:?}", parent.id()));
        }

        if let Some(fields) = span.extensions().get::<json::Map<String, Value>>() {
            for (key, value) in fields {
                span_json[key] = value.clone();
            }
        }

        self.collector.insert(span_json);
    }

    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        if !self.has_target(event.metadata().target()) {
            return;
        }

        let mut visitor = JsonVisitor::default();
        event.record(&mut visitor);

        let name = visitor
            .fields
            .remove("message")
            .and_then(|value| value.as_str().map(|s| s.to_string()))
            .unwrap_or_default();

        let mut event_json = json::json!({
            "name": name,
            "target": event.metadata().target(),
            "type": "event",
            "level": event.metadata().level().to_string(),
        });

        for (key, value) in visitor.fields {
            event_json[key] = value;
        }

        self.collector.insert(event_json);
    }
}
