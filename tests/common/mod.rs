#![allow(dead_code)]

use shub_conveyor::{DefaultRegistry, RegistryClient};
use std::{
    collections::HashMap,
    io::{BufRead, BufReader, Write},
    net::{SocketAddr, TcpListener},
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};
use tokio::runtime::Runtime;

pub const HEX: &str = "0123456789abcdef0123456789abcdef";

/// A canned response
#[derive(Clone, Debug)]
pub struct Reply {
    pub status: &'static str,
    /// Value for the Content-Length header, if any
    pub declared_length: Option<usize>,
    pub body: Vec<u8>,
    pub delay: Duration,
}

impl Reply {
    pub fn ok(body: &[u8]) -> Self {
        Reply {
            status: "200 OK",
            declared_length: Some(body.len()),
            body: body.to_vec(),
            delay: Duration::from_millis(0),
        }
    }

    pub fn status(status: &'static str) -> Self {
        Reply {
            status,
            ..Reply::ok(status.as_bytes())
        }
    }

    pub fn declared_length(mut self, length: Option<usize>) -> Self {
        self.declared_length = length;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A request as the mock server saw it
#[derive(Clone, Debug)]
pub struct Seen {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
}

/// Minimal HTTP/1.1 server answering each path with a fixed [Reply]
///
/// Every connection is closed after one response, so a body shorter than its
/// declared length looks like a connection dropped mid-transfer.
pub struct MockServer {
    pub addr: SocketAddr,
    pub requests: Arc<Mutex<Vec<Seen>>>,
    routes: Arc<Mutex<HashMap<String, Reply>>>,
}

impl MockServer {
    pub fn start(routes: Vec<(&str, Reply)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let routes: Arc<Mutex<HashMap<String, Reply>>> = Arc::new(Mutex::new(
            routes
                .into_iter()
                .map(|(path, reply)| (path.to_owned(), reply))
                .collect(),
        ));
        let requests: Arc<Mutex<Vec<Seen>>> = Arc::new(Mutex::new(Vec::new()));

        let server_routes = Arc::clone(&routes);
        let server_requests = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let routes = Arc::clone(&server_routes);
                let requests = Arc::clone(&server_requests);
                thread::spawn(move || {
                    let mut reader = BufReader::new(stream.try_clone().unwrap());
                    let mut request_line = String::new();
                    if reader.read_line(&mut request_line).is_err() {
                        return;
                    }
                    let parts: Vec<&str> = request_line.trim().splitn(3, ' ').collect();
                    if parts.len() < 2 {
                        return;
                    }
                    let mut headers = HashMap::new();
                    loop {
                        let mut line = String::new();
                        if reader.read_line(&mut line).is_err() || line.trim().is_empty() {
                            break;
                        }
                        if let Some((k, v)) = line.trim().split_once(": ") {
                            headers.insert(k.to_lowercase(), v.to_owned());
                        }
                    }
                    let seen = Seen {
                        method: parts[0].to_owned(),
                        path: parts[1].to_owned(),
                        headers,
                    };
                    let reply = routes
                        .lock()
                        .unwrap()
                        .get(&seen.path)
                        .cloned()
                        .unwrap_or_else(|| Reply::status("404 Not Found"));
                    requests.lock().unwrap().push(seen);

                    thread::sleep(reply.delay);
                    let mut head = format!("HTTP/1.1 {}\r\nConnection: close\r\n", reply.status);
                    if let Some(length) = reply.declared_length {
                        head.push_str(&format!("Content-Length: {}\r\n", length));
                    }
                    head.push_str("\r\n");
                    let _ = stream.write_all(head.as_bytes());
                    let _ = stream.write_all(&reply.body);
                    let _ = stream.flush();
                });
            }
        });

        MockServer {
            addr,
            requests,
            routes,
        }
    }

    /// Answer another path
    pub fn route(&self, path: &str, reply: Reply) {
        self.routes.lock().unwrap().insert(path.to_owned(), reply);
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// A default registry whose endpoint is this server's `/api/container/`
    pub fn registry(&self) -> DefaultRegistry {
        DefaultRegistry::new()
            .endpoint(self.url("/api/container/").parse().unwrap())
            .unwrap()
    }

    pub fn client(&self) -> RegistryClient {
        RegistryClient::builder()
            .registry(&self.registry())
            .build()
            .unwrap()
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.requests.lock().unwrap().clone()
    }
}

pub fn manifest_json(image_url: &str) -> Vec<u8> {
    serde_json::json!({
        "image": image_url,
        "name": "vsoch/hello-world",
        "tag": "latest",
        "version": "e279432e6d3962777bb7b5e8d54f30f4",
    })
    .to_string()
    .into_bytes()
}

pub fn runtime() -> Runtime {
    let _ = env_logger::builder().is_test(true).try_init();
    Runtime::new().unwrap()
}
