#![allow(dead_code)]

use std::{
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use quizgrade::{CapabilityError, GradingCapability};

type Responder = dyn Fn(&str) -> Result<String, CapabilityError> + Send + Sync;

/// Answers each call by looking only at the user prompt.
pub struct ScriptedCapability {
    respond: Box<Responder>,
    calls:   Mutex<Vec<(String, String, String)>>,
}

impl ScriptedCapability {
    pub fn new(
        respond: impl Fn(&str) -> Result<String, CapabilityError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            respond: Box::new(respond),
            calls:   Mutex::new(Vec::new()),
        }
    }

    pub fn always(text: &'static str) -> Self {
        Self::new(move |_| Ok(text.to_string()))
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// `(system, user, model)` for every call, in call order.
    pub fn calls(&self) -> Vec<(String, String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GradingCapability for ScriptedCapability {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: &str,
    ) -> Result<String, CapabilityError> {
        self.calls.lock().unwrap().push((
            system_prompt.to_string(),
            user_prompt.to_string(),
            model.to_string(),
        ));
        (self.respond)(user_prompt)
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

/// Sleeps on every call and records the highest number of overlapping calls.
pub struct SlowCapability {
    delay:     Duration,
    in_flight: AtomicUsize,
    peak:      AtomicUsize,
    calls:     AtomicUsize,
}

impl SlowCapability {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GradingCapability for SlowCapability {
    async fn complete(
        &self,
        _system_prompt: &str,
        user_prompt: &str,
        _model: &str,
    ) -> Result<String, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if user_prompt.contains("FAIL") {
            Err(CapabilityError::Other("scripted failure".into()))
        } else {
            Ok(r#"{"score": 1, "feedback": "ok"}"#.to_string())
        }
    }

    fn provider_name(&self) -> &'static str {
        "slow"
    }
}
