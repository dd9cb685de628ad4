//! Minimal HTTP/1.1 server imitating the conversion report endpoint.
//!
//! Serves a fixed, time-sorted dataset. Each GET is answered with the records
//! whose time falls in `[start_date, end_date)`, sliced by `offset`/`limit`,
//! and a non-empty `next_page` while more records remain.

use serde_json::json;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

/// One record in the served dataset.
#[derive(Debug, Clone)]
pub struct MockConversion {
    pub id: String,
    /// `%Y-%m-%d %H:%M:%S`, same as the real API.
    pub time: String,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportServerOptions {
    /// Answer this many requests with 503 before serving data.
    pub fail_first: usize,
}

pub struct ReportServer {
    pub url: String,
    requests: Arc<AtomicUsize>,
}

impl ReportServer {
    /// Requests received so far, including failed ones.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

pub fn start(records: Vec<MockConversion>) -> ReportServer {
    start_with_options(records, ReportServerOptions::default())
}

pub fn start_with_options(mut records: Vec<MockConversion>, opts: ReportServerOptions) -> ReportServer {
    records.sort_by(|a, b| a.time.cmp(&b.time));
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let records = Arc::new(records);
    let requests = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&requests);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let records = Arc::clone(&records);
            let n = counter.fetch_add(1, Ordering::SeqCst);
            thread::spawn(move || handle(stream, &records, n < opts.fail_first));
        }
    });
    ReportServer {
        url: format!("http://127.0.0.1:{}/conversion", port),
        requests,
    }
}

fn handle(mut stream: std::net::TcpStream, records: &[MockConversion], fail: bool) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    if fail {
        let _ = stream.write_all(
            b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        return;
    }
    let Some(target) = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
    else {
        return;
    };

    let body = page(records, target).to_string();
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.write_all(body.as_bytes());
}

fn page(records: &[MockConversion], target: &str) -> serde_json::Value {
    let url = url::Url::parse(&format!("http://localhost{}", target)).expect("request target");
    let param = |name: &str| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default()
    };
    let start = param("start_date");
    let end = param("end_date");
    let offset: usize = param("offset").parse().unwrap_or(0);
    let limit: usize = param("limit").parse().unwrap_or(100);

    let in_window: Vec<_> = records
        .iter()
        .filter(|r| r.time >= start && r.time < end)
        .collect();
    let conversions: Vec<_> = in_window
        .iter()
        .skip(offset)
        .take(limit)
        .map(|r| {
            json!({"conversion_data": {
                "conversion_id": r.id,
                "conversion_time": r.time,
                "publisher_reference": "u7:app",
                "advertiser_reference": "In-App purchase",
                "customer_reference": "cust",
                "conversion_value": {
                    "conversion_status": "approved",
                    "value": r.value,
                    "publisher_commission": 0.5
                }
            }})
        })
        .collect();
    let next_page = if offset + limit < in_window.len() {
        format!("/conversion?offset={}", offset + limit)
    } else {
        String::new()
    };
    json!({
        "count": in_window.len(),
        "conversions": conversions,
        "hypermedia": {"pagination": {"next_page": next_page}}
    })
}
