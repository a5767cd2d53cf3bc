// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for running against an in-memory Kubernetes API server.

use crate::constants::secrets::{SERVICE_ACCOUNT_TOKEN_TYPE, TOKEN_KEY};
use http::{Method, Request, Response, StatusCode};
use http_body_util::BodyExt;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::client::Body;
use kube::{Client, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

type Mutation = Box<dyn FnOnce(&mut Value) + Send>;

/// A fake API server keeping objects in memory.
///
/// Objects are addressed by their URL path. Writes bump a global
/// `resourceVersion`, `PUT`s carrying an outdated one are rejected with 409,
/// and `generateName` is honoured on create. Token secrets can be filled in
/// after a number of reads to stand in for the token controller.
#[derive(Clone, Default)]
pub struct FakeApiServer {
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    objects: BTreeMap<String, Value>,
    resource_version: u64,
    generated: u64,
    /// Fill token secrets on this read, with this value
    token_fill: Option<(usize, Vec<u8>)>,
    token_reads: HashMap<String, usize>,
    reads: HashMap<String, usize>,
    /// Applied just before serving the given read of a path
    read_hooks: Vec<(String, usize, Mutation)>,
    /// Reject this many upcoming updates with a conflict
    update_conflicts: usize,
    /// Status code and count for upcoming failing deletes
    delete_failures: Option<(u16, usize)>,
    requests: Vec<(Method, String)>,
}

impl State {
    fn next_version(&mut self) -> String {
        self.resource_version += 1;
        self.resource_version.to_string()
    }

    fn handle(&mut self, method: &Method, path: &str, body: &[u8]) -> (StatusCode, Value) {
        self.requests.push((method.clone(), path.to_string()));

        match *method {
            Method::GET => self.get(path),
            Method::POST => self.create(path, body),
            Method::PUT => self.replace(path, body),
            Method::DELETE => self.delete(path),
            _ => (
                StatusCode::METHOD_NOT_ALLOWED,
                status_json(405, "MethodNotAllowed", "method not allowed"),
            ),
        }
    }

    fn get(&mut self, path: &str) -> (StatusCode, Value) {
        let reads = {
            let count = self.reads.entry(path.to_string()).or_default();
            *count += 1;
            *count
        };

        let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.read_hooks)
            .into_iter()
            .partition(|(p, nth, _)| p == path && *nth == reads);
        self.read_hooks = pending;
        for (_, _, mutate) in due {
            let version = self.next_version();
            if let Some(obj) = self.objects.get_mut(path) {
                mutate(obj);
                obj["metadata"]["resourceVersion"] = json!(version);
            }
        }

        self.fill_token(path);

        match self.objects.get(path) {
            Some(obj) => (StatusCode::OK, obj.clone()),
            None => not_found(path),
        }
    }

    fn fill_token(&mut self, path: &str) {
        let Some((after, token)) = self.token_fill.clone() else {
            return;
        };
        let Some(obj) = self.objects.get(path) else {
            return;
        };
        if obj["type"] != SERVICE_ACCOUNT_TOKEN_TYPE || !obj["data"][TOKEN_KEY].is_null() {
            return;
        }

        let reads = self.token_reads.entry(path.to_string()).or_default();
        *reads += 1;
        if *reads < after {
            return;
        }

        let mut secret: Secret = serde_json::from_value(obj.clone()).unwrap();
        secret
            .data
            .get_or_insert_with(Default::default)
            .insert(TOKEN_KEY.to_string(), ByteString(token));
        let version = self.next_version();
        secret.metadata.resource_version = Some(version);
        self.objects
            .insert(path.to_string(), serde_json::to_value(secret).unwrap());
    }

    fn create(&mut self, collection: &str, body: &[u8]) -> (StatusCode, Value) {
        let mut obj: Value = match serde_json::from_slice(body) {
            Ok(v) => v,
            Err(e) => return (StatusCode::BAD_REQUEST, status_json(400, "BadRequest", &e.to_string())),
        };

        let name = match obj["metadata"]["name"].as_str() {
            Some(name) => name.to_string(),
            None => {
                self.generated += 1;
                let prefix = obj["metadata"]["generateName"].as_str().unwrap_or_default();
                format!("{}{:05}", prefix, self.generated)
            }
        };
        let path = format!("{}/{}", collection, name);
        if self.objects.contains_key(&path) {
            return (
                StatusCode::CONFLICT,
                status_json(409, "AlreadyExists", &format!("{} already exists", name)),
            );
        }

        let version = self.next_version();
        obj["metadata"]["name"] = json!(name);
        obj["metadata"]["uid"] = json!(format!("uid-{}", version));
        obj["metadata"]["resourceVersion"] = json!(version);
        self.objects.insert(path, obj.clone());
        (StatusCode::CREATED, obj)
    }

    fn delete(&mut self, path: &str) -> (StatusCode, Value) {
        if let Some((code, remaining)) = self.delete_failures.take() {
            if remaining > 1 {
                self.delete_failures = Some((code, remaining - 1));
            }
            if code == 404 {
                // someone else removed it first
                self.objects.remove(path);
                return not_found(path);
            }
            let status = StatusCode::from_u16(code).unwrap();
            return (status, status_json(code, "InternalError", "delete failed"));
        }

        match self.objects.remove(path) {
            Some(obj) => (StatusCode::OK, obj),
            None => not_found(path),
        }
    }

    fn replace(&mut self, path: &str, body: &[u8]) -> (StatusCode, Value) {
        let mut obj: Value = match serde_json::from_slice(body) {
            Ok(v) => v,
            Err(e) => return (StatusCode::BAD_REQUEST, status_json(400, "BadRequest", &e.to_string())),
        };
        let Some(current) = self.objects.get(path) else {
            return not_found(path);
        };

        let sent = obj["metadata"]["resourceVersion"].as_str();
        let stale = sent.is_some_and(|v| Some(v) != current["metadata"]["resourceVersion"].as_str());
        if stale {
            return conflict();
        }
        if self.update_conflicts > 0 {
            self.update_conflicts -= 1;
            return conflict();
        }

        obj["metadata"]["resourceVersion"] = json!(self.next_version());
        self.objects.insert(path.to_string(), obj.clone());
        (StatusCode::OK, obj)
    }
}

fn status_json(code: u16, reason: &str, message: &str) -> Value {
    json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
}

fn conflict() -> (StatusCode, Value) {
    (
        StatusCode::CONFLICT,
        status_json(
            409,
            "Conflict",
            "the object has been modified; please apply your changes to the latest version and try again",
        ),
    )
}

fn not_found(path: &str) -> (StatusCode, Value) {
    (
        StatusCode::NOT_FOUND,
        status_json(404, "NotFound", &format!("{} not found", path)),
    )
}

fn object_path<K: Resource<DynamicType = ()>>(namespace: &str, name: &str) -> String {
    format!("{}/{}", K::url_path(&(), Some(namespace)), name)
}

impl FakeApiServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object. Name and namespace are taken from its metadata.
    pub fn with_object<K>(self, obj: &K) -> Self
    where
        K: Resource<DynamicType = ()> + Serialize,
    {
        let namespace = obj.meta().namespace.clone().unwrap_or_default();
        let name = obj.meta().name.clone().unwrap_or_default();
        {
            let mut state = self.state.lock().unwrap();
            let mut value = serde_json::to_value(obj).unwrap();
            let version = state.next_version();
            value["metadata"]["resourceVersion"] = json!(version);
            if value["metadata"]["uid"].is_null() {
                value["metadata"]["uid"] = json!(format!("uid-{}", version));
            }
            state.objects.insert(object_path::<K>(&namespace, &name), value);
        }
        self
    }

    /// Fill token secrets with `token` on their `reads`-th read
    pub fn fill_tokens_after(self, reads: usize, token: &str) -> Self {
        self.state.lock().unwrap().token_fill = Some((reads, token.as_bytes().to_vec()));
        self
    }

    /// Reject the next `count` updates with a 409 conflict
    pub fn conflict_on_next_updates(self, count: usize) -> Self {
        self.state.lock().unwrap().update_conflicts = count;
        self
    }

    /// Answer the next `count` deletes with `code`. A 404 also removes the
    /// object, as if another client deleted it first.
    pub fn fail_next_deletes(self, count: usize, code: u16) -> Self {
        self.state.lock().unwrap().delete_failures = (count > 0).then_some((code, count));
        self
    }

    /// Modify an object right before its `nth` read is served, as a
    /// concurrent writer would.
    pub fn mutate_on_read<K, F>(self, namespace: &str, name: &str, nth: usize, mutate: F) -> Self
    where
        K: Resource<DynamicType = ()> + Serialize + DeserializeOwned,
        F: FnOnce(&mut K) + Send + 'static,
    {
        let hook: Mutation = Box::new(move |value: &mut Value| {
            let mut obj: K = serde_json::from_value(value.clone()).unwrap();
            mutate(&mut obj);
            *value = serde_json::to_value(obj).unwrap();
        });
        self.state
            .lock()
            .unwrap()
            .read_hooks
            .push((object_path::<K>(namespace, name), nth, hook));
        self
    }

    /// Current stored version of an object
    pub fn get<K>(&self, namespace: &str, name: &str) -> Option<K>
    where
        K: Resource<DynamicType = ()> + DeserializeOwned,
    {
        let state = self.state.lock().unwrap();
        state
            .objects
            .get(&object_path::<K>(namespace, name))
            .map(|v| serde_json::from_value(v.clone()).unwrap())
    }

    /// All stored objects of a kind in a namespace
    pub fn list<K>(&self, namespace: &str) -> Vec<K>
    where
        K: Resource<DynamicType = ()> + DeserializeOwned,
    {
        let collection = format!("{}/", K::url_path(&(), Some(namespace)));
        let state = self.state.lock().unwrap();
        state
            .objects
            .iter()
            .filter(|(path, _)| {
                path.strip_prefix(&collection)
                    .is_some_and(|rest| !rest.contains('/'))
            })
            .map(|(_, v)| serde_json::from_value(v.clone()).unwrap())
            .collect()
    }

    /// Number of requests served with the given method
    pub fn request_count(&self, method: Method) -> usize {
        let state = self.state.lock().unwrap();
        state.requests.iter().filter(|(m, _)| *m == method).count()
    }

    /// Build a kube Client backed by this server
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }
}

impl Service<Request<Body>> for FakeApiServer {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let state = self.state.clone();

        Box::pin(async move {
            let method = req.method().clone();
            let path = req.uri().path().to_string();
            let body = req.into_body().collect().await?.to_bytes();

            let (status, value) = state.lock().unwrap().handle(&method, &path, &body);

            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&value)?))
                .unwrap())
        })
    }
}
