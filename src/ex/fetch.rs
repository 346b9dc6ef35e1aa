use std::sync::Arc;
use http::StatusCode;
use crate::exec::{Lane, Resolver};
use crate::promise::Promise;

/// Transfers that report progress while they run on some other thread.
///
/// The client gets a [`Resolver`] for each request. It should `notify` as
/// bytes arrive, then resolve with the response or reject with the
/// transport error. HTTP error statuses are responses, not rejections.
pub struct Fetch<C> {
    client: Arc<C>,
}

#[derive(Clone, Debug)]
pub struct Request {
    pub method: String,
    pub url:    String,
}

#[derive(Clone, Debug, Default)]
pub struct Response {
    pub status: StatusCode,
    pub body:   String,
}

pub trait Client: Send + Sync + 'static {
    fn fetch(&self, request: Request, resolver: Resolver<Response>);
}

impl<C: Client> Fetch<C> {
    pub fn new(client: C) -> Self {
        Self { client: Arc::new(client) }
    }

    pub fn get(&self, lane: &Lane, url: &str) -> Promise<Response> {
        self.fetch(lane, Request::get(url))
    }

    pub fn fetch(&self, lane: &Lane, request: Request) -> Promise<Response> {
        let (promise, resolver) = lane.resolver();
        self.client.fetch(request, resolver);
        promise
    }
}

impl Request {
    pub fn get(url: &str) -> Self {
        Self {
            method: "GET".to_owned(),
            url:    url.to_owned(),
        }
    }
}

impl<C> Clone for Fetch<C> {
    fn clone(&self) -> Self {
        Self { client: self.client.clone() }
    }
}
