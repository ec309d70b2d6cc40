//! Test doubles for the transport and navigation seams.
//!
//! Public so integration tests and the CLI's tests can script a backend
//! without a network.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use crate::error::{ConsoleError, Result};
use crate::navigation::{Navigator, Route};
use crate::transport::{HttpRequest, HttpResponse, Transport};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

enum Scripted {
    Response(HttpResponse),
    NetworkFailure(String),
}

/// Replays queued responses in order and records every request it sees.
#[derive(Default)]
pub struct ScriptedTransport {
    queue: Mutex<VecDeque<Scripted>>,
    fallback: Mutex<Option<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, response: HttpResponse) {
        lock(&self.queue).push_back(Scripted::Response(response));
    }

    pub fn push_json(&self, status: u16, body: serde_json::Value) {
        self.push_response(HttpResponse::json(status, &body));
    }

    pub fn push_status(&self, status: u16) {
        self.push_response(HttpResponse::new(status, Vec::new()));
    }

    pub fn push_raw(&self, status: u16, body: &str) {
        self.push_response(HttpResponse::new(status, body.as_bytes().to_vec()));
    }

    pub fn push_network_failure(&self, details: &str) {
        lock(&self.queue).push_back(Scripted::NetworkFailure(details.to_string()));
    }

    /// Response used once the queue is empty.
    pub fn set_fallback(&self, response: HttpResponse) {
        *lock(&self.fallback) = Some(response);
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests).clone()
    }

    pub fn paths(&self) -> Vec<String> {
        lock(&self.requests)
            .iter()
            .map(|request| format!("{} {}", request.method, request.path))
            .collect()
    }

    pub fn remaining(&self) -> usize {
        lock(&self.queue).len()
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        lock(&self.requests).push(request.clone());
        let next = lock(&self.queue).pop_front();
        match next {
            Some(Scripted::Response(response)) => Ok(response),
            Some(Scripted::NetworkFailure(details)) => Err(ConsoleError::Network {
                context: format!("{} {}", request.method, request.path),
                details,
            }),
            None => match lock(&self.fallback).clone() {
                Some(response) => Ok(response),
                None => Err(ConsoleError::Network {
                    context: format!("{} {}", request.method, request.path),
                    details: "no scripted response".to_string(),
                }),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationEvent {
    Navigate(Route),
    HardRedirect(Route),
}

#[derive(Default)]
pub struct RecordingNavigator {
    events: Mutex<Vec<NavigationEvent>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NavigationEvent> {
        lock(&self.events).clone()
    }

    pub fn navigations(&self) -> Vec<Route> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                NavigationEvent::Navigate(route) => Some(route),
                NavigationEvent::HardRedirect(_) => None,
            })
            .collect()
    }

    pub fn hard_redirects(&self) -> Vec<Route> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                NavigationEvent::HardRedirect(route) => Some(route),
                NavigationEvent::Navigate(_) => None,
            })
            .collect()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &Route) {
        lock(&self.events).push(NavigationEvent::Navigate(route.clone()));
    }

    fn hard_redirect(&self, route: &Route) {
        lock(&self.events).push(NavigationEvent::HardRedirect(route.clone()));
    }
}
