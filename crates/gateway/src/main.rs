//! # Ingest Gateway
//!
//! 画像・PDFの取り込み口となる単一エンドポイントのアップロードサーバー。
//!
//! ## 役割
//! - multipart/form-dataの `image` パートを受け取る（ボディ上限 2 MiB）
//! - 先頭バイトからコンテンツ種別を判定し、JPEG / GIF / PNG / PDF のみ受理
//! - UUID v4 のファイル名で `TMP_DIR` に保存
//! - 全リクエストをCombined Log Formatで標準エラー出力に記録
//!
//! ## API エンドポイント
//! - `POST /upload` — 成功時 `200 SUCCESS`

mod access_log;
mod config;
mod endpoints;
mod error;
mod storage;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;

use crate::access_log::AccessLogSink;
use crate::config::{GatewayConfig, GatewayState, MAX_UPLOAD_SIZE};
use crate::storage::LocalDirStore;

/// ルーターを構築する。
///
/// `/upload` 以外のパスは404、`/upload` へのPOST以外は405。
/// アクセスログはフォールバックを含む全ルートに適用される。
pub(crate) fn router(state: Arc<GatewayState>) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_upload_size);

    Router::new()
        .route(
            "/upload",
            post(endpoints::handle_upload).layer(body_limit),
        )
        .fallback(|| async { (StatusCode::NOT_FOUND, "404 page not found") })
        .layer(axum::middleware::from_fn_with_state(
            state.access_log.clone(),
            access_log::combined_log,
        ))
        .with_state(state)
}

/// Ctrl-C / SIGTERM を待つ。
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Ctrl-Cハンドラの登録に失敗");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERMハンドラの登録に失敗");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("シャットダウンします");
}

// ---------------------------------------------------------------------------
// エントリポイント
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // .env は任意。なければプロセス環境変数のみを使う
    match dotenvy::dotenv() {
        Ok(path) => tracing::info!(path = %path.display(), ".envを読み込みました"),
        Err(e) if e.not_found() => tracing::info!(".envがないため環境変数のみを使用します"),
        Err(e) => anyhow::bail!("Can not read env file : {e}"),
    }

    let config = GatewayConfig::from_env()?;
    tracing::info!(
        port = config.port,
        status_mode = ?config.status_mode,
        "設定を読み込みました"
    );

    let store = LocalDirStore::new(&config.upload_dir);
    tracing::info!(upload_dir = %store.dir().display(), "アップロード先");

    let state = Arc::new(GatewayState {
        store: Box::new(store),
        status_mode: config.status_mode,
        max_upload_size: MAX_UPLOAD_SIZE,
        access_log: AccessLogSink::stderr(),
    });

    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Gatewayを {} で起動します", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// テスト
// ---------------------------------------------------------------------------
