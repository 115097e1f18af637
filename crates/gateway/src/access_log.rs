//! # アクセスログ
//!
//! 全リクエスト（ルート不一致を含む）をCombined Log Formatで書き出す。
//! 出力先は [`AccessLogSink`]（本番は標準エラー出力）。
//!
//! ```text
//! 127.0.0.1 - - [18/Oct/2026:10:00:00 +0900] "POST /upload HTTP/1.1" 200 7 "-" "curl/8.5.0"
//! ```

use std::io::Write;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::HttpBody;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, HeaderMap, HeaderName};
use axum::middleware::Next;
use axum::response::Response;
use chrono::{DateTime, FixedOffset, Local};

/// アクセスログの書き込み先。クローンは同じライターを共有する。
#[derive(Clone)]
pub struct AccessLogSink(Arc<Mutex<Box<dyn Write + Send>>>);

impl AccessLogSink {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self(Arc::new(Mutex::new(Box::new(writer))))
    }

    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }

    /// 1行書き込む。失敗してもレスポンスには影響させない。
    fn write_line(&self, line: &str) {
        let Ok(mut writer) = self.0.lock() else {
            return;
        };
        if let Err(e) = writeln!(writer, "{line}").and_then(|()| writer.flush()) {
            tracing::warn!(error = %e, "アクセスログの書き込みに失敗");
        }
    }
}

/// 1リクエスト分のアクセスログ項目
#[derive(Debug, Clone)]
pub struct AccessEntry {
    pub host: Option<String>,
    pub time: DateTime<FixedOffset>,
    pub method: String,
    pub uri: String,
    pub proto: String,
    pub status: u16,
    pub size: Option<u64>,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
}

impl AccessEntry {
    /// Combined Log Formatの1行（改行なし）に整形する。
    pub fn to_combined(&self) -> String {
        let dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
        format!(
            "{} - - [{}] \"{} {} {}\" {} {} \"{}\" \"{}\"",
            dash(&self.host),
            self.time.format("%d/%b/%Y:%H:%M:%S %z"),
            self.method,
            self.uri,
            self.proto,
            self.status,
            self.size.map_or_else(|| "-".to_string(), |s| s.to_string()),
            escape_quotes(&dash(&self.referer)),
            escape_quotes(&dash(&self.user_agent)),
        )
    }
}

fn escape_quotes(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"")
}

fn header_string(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// `axum::middleware::from_fn_with_state` 用のアクセスログミドルウェア。
///
/// 接続元アドレスは `into_make_service_with_connect_info` で起動した場合のみ記録される。
pub async fn combined_log(
    State(sink): State<AccessLogSink>,
    req: Request,
    next: Next,
) -> Response {
    let time = Local::now().fixed_offset();
    let host = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());
    let method = req.method().to_string();
    let uri = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().to_string());
    let proto = format!("{:?}", req.version());
    let referer = header_string(req.headers(), header::REFERER);
    let user_agent = header_string(req.headers(), header::USER_AGENT);

    let response = next.run(req).await;

    let entry = AccessEntry {
        host,
        time,
        method,
        uri,
        proto,
        status: response.status().as_u16(),
        size: response.body().size_hint().exact(),
        referer,
        user_agent,
    };
    sink.write_line(&entry.to_combined());

    response
}
