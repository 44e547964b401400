//! Captures everything published on a bus.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Instant;

use narada_core::{LicenseVerdict, ProcessKind, StatusEvent, StatusEventBus};

/// `(running, message, error)` of one `serviceStatus` event.
pub type Status = (bool, String, bool);

#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<(Instant, StatusEvent)>>>,
}

impl Recorder {
    pub fn attach(bus: &StatusEventBus) -> Self {
        let recorder = Self::default();
        let sink = Arc::clone(&recorder.events);
        bus.subscribe_all(move |event| {
            sink.lock().unwrap().push((Instant::now(), event.clone()));
        });
        recorder
    }

    pub fn events(&self) -> Vec<StatusEvent> {
        self.events.lock().unwrap().iter().map(|(_, e)| e.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn statuses(&self, of: ProcessKind) -> Vec<Status> {
        self.timed_statuses(of).into_iter().map(|(_, s)| s).collect()
    }

    pub fn timed_statuses(&self, of: ProcessKind) -> Vec<(Instant, Status)> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(at, event)| match event {
                StatusEvent::ServiceStatus {
                    kind,
                    running,
                    message,
                    error,
                    ..
                } if *kind == of => Some((*at, (*running, message.clone(), *error))),
                _ => None,
            })
            .collect()
    }

    pub fn verdicts(&self) -> Vec<LicenseVerdict> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(_, event)| match event {
                StatusEvent::LicenseStatus { verdict } => Some(verdict.clone()),
                _ => None,
            })
            .collect()
    }
}
