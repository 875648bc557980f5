//! Preview server with live reload
//!
//! Pages are rendered on request from an in-memory snapshot of the site.
//! In watch mode the snapshot is rebuilt after every change and swapped in
//! whole, so a request always sees one complete content table.

use anyhow::Result;
use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::{header, Request, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use notify::RecursiveMode;
use notify_debouncer_mini::new_debouncer;
use percent_encoding::percent_decode_str;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::broadcast;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::content::ContentTable;
use crate::generator::{Generator, PageStatus};
use crate::templates::STYLESHEET;
use crate::Folio;

/// Live reload script injected into HTML pages
const LIVE_RELOAD_SCRIPT: &str = r#"
<script>
(function() {
    var ws = new WebSocket('ws://' + location.host + '/__livereload');
    ws.onmessage = function(msg) {
        if (msg.data === 'reload') {
            location.reload();
        }
    };
    ws.onclose = function() {
        setTimeout(function() { location.reload(); }, 1000);
    };
})();
</script>
</body>
"#;

/// Everything needed to answer a request: the renderer and its content
pub struct Site {
    pub generator: Generator,
    pub table: ContentTable,
}

impl Site {
    /// Read configuration and posts from disk
    pub fn load(base_dir: &std::path::Path) -> Result<Self> {
        let folio = Folio::new(base_dir)?;
        let table = folio.load_table()?;
        let generator = Generator::new(&folio)?;
        Ok(Self { generator, table })
    }
}

/// Server state
pub struct ServerState {
    site: RwLock<Arc<Site>>,
    reload_tx: broadcast::Sender<()>,
    live_reload: bool,
}

impl ServerState {
    pub fn new(site: Site, live_reload: bool) -> Arc<Self> {
        let (reload_tx, _) = broadcast::channel::<()>(16);
        Arc::new(Self {
            site: RwLock::new(Arc::new(site)),
            reload_tx,
            live_reload,
        })
    }

    /// Current site, cheap to clone and safe to hold across awaits
    fn snapshot(&self) -> Arc<Site> {
        let guard = self.site.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Swap in a freshly loaded site and tell browsers to reload
    fn replace(&self, site: Site) {
        let mut guard = self.site.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(site);
        drop(guard);
        let _ = self.reload_tx.send(());
    }

    fn html(&self, status: StatusCode, html: String) -> Response {
        let html = if self.live_reload {
            inject_live_reload(&html)
        } else {
            html
        };
        (status, Html(html)).into_response()
    }
}

/// Build the router for a site
///
/// Only the live reload socket has a fixed path. Pages are matched against
/// the current snapshot's `root` and `blog_dir`, so a reloaded
/// `_config.yml` moves the routes along with the generated links.
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/__livereload", get(livereload_handler))
        .fallback(page_handler)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Where a request path below the site root leads
#[derive(Debug, PartialEq, Eq)]
enum Route<'a> {
    Home,
    BlogIndex,
    Post(&'a str),
    Feed,
    Stylesheet,
    File,
}

fn route<'a>(path: &'a str, blog_dir: &str) -> Route<'a> {
    match path {
        "/" | "/index.html" => return Route::Home,
        "/atom.xml" => return Route::Feed,
        "/css/style.css" => return Route::Stylesheet,
        _ => {}
    }

    let blog_dir = blog_dir.trim_matches('/');
    let Some(rest) = path.strip_prefix('/').and_then(|p| p.strip_prefix(blog_dir)) else {
        return Route::File;
    };
    match rest {
        "" | "/" | "/index.html" => Route::BlogIndex,
        _ => match rest.strip_prefix('/') {
            Some(slug) => {
                let slug = slug
                    .strip_suffix("/index.html")
                    .or_else(|| slug.strip_suffix('/'))
                    .unwrap_or(slug);
                if slug.contains('/') {
                    Route::File
                } else {
                    Route::Post(slug)
                }
            }
            None => Route::File,
        },
    }
}

/// Request path relative to `root`, or `None` outside of it
fn strip_root<'a>(path: &'a str, root: &str) -> Option<&'a str> {
    let root = root.trim_end_matches('/');
    if root.is_empty() {
        return Some(path);
    }
    match path.strip_prefix(root)? {
        "" => Some("/"),
        rest if rest.starts_with('/') => Some(rest),
        _ => None,
    }
}

/// Start the preview server
pub async fn start(folio: &Folio, ip: &str, port: u16, watch: bool, open: bool) -> Result<()> {
    let site = Site::load(&folio.base_dir)?;
    tracing::info!("Serving {} posts", site.table.len());
    let state = ServerState::new(site, watch);
    let app = router(Arc::clone(&state));

    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}{}", ip, port, folio.config.root);
    println!("Server running at {}", url);
    if watch {
        println!("Live reload enabled. Watching for changes...");
    }
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    if watch {
        let base_dir = folio.base_dir.clone();
        let source_dir = folio.source_dir.clone();
        let config_path = folio.config_path();
        let state = Arc::clone(&state);

        tokio::task::spawn_blocking(move || {
            if let Err(e) = watch_and_reload(base_dir, source_dir, config_path, state) {
                tracing::error!("File watcher error: {}", e);
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Rebuild the site snapshot whenever sources or configuration change
fn watch_and_reload(
    base_dir: PathBuf,
    source_dir: PathBuf,
    config_path: PathBuf,
    state: Arc<ServerState>,
) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;

    if source_dir.exists() {
        debouncer
            .watcher()
            .watch(&source_dir, RecursiveMode::Recursive)?;
        tracing::debug!("Watching: {:?}", source_dir);
    }
    if config_path.exists() {
        debouncer
            .watcher()
            .watch(&config_path, RecursiveMode::NonRecursive)?;
        tracing::debug!("Watching: {:?}", config_path);
    }

    for result in rx {
        match result {
            Ok(events) => {
                let relevant = events.iter().any(|e| {
                    let path = e.path.to_string_lossy();
                    !path.contains(".git") && !path.contains(".DS_Store") && !path.ends_with('~')
                });
                if !relevant {
                    continue;
                }

                for event in &events {
                    tracing::info!("File changed: {}", event.path.display());
                }

                match Site::load(&base_dir) {
                    Ok(site) => {
                        tracing::info!("Reloaded {} posts", site.table.len());
                        state.replace(site);
                    }
                    Err(e) => tracing::error!("Reload failed, keeping previous content: {:#}", e),
                }
            }
            Err(e) => tracing::error!("Watch error: {:?}", e),
        }
    }

    Ok(())
}

async fn page_handler(State(state): State<Arc<ServerState>>, request: Request<Body>) -> Response {
    let site = state.snapshot();
    let config = &site.generator.folio().config;

    let Some(local) = strip_root(request.uri().path(), &config.root).map(str::to_string) else {
        return not_found(&state, &site);
    };
    let decoded = percent_decode_str(&local).decode_utf8_lossy().into_owned();

    let rendered = match route(&decoded, &config.blog_dir) {
        Route::Home => site
            .generator
            .render_home(&site.table)
            .map(|html| state.html(StatusCode::OK, html)),
        Route::BlogIndex => site
            .generator
            .render_blog_index(&site.table)
            .map(|html| state.html(StatusCode::OK, html)),
        Route::Post(slug) => site.generator.render_post(&site.table, slug).map(|page| {
            let status = match page.status {
                PageStatus::Found => StatusCode::OK,
                PageStatus::NotFound => StatusCode::NOT_FOUND,
            };
            state.html(status, page.html)
        }),
        Route::Feed => Ok((
            [(header::CONTENT_TYPE, "application/atom+xml; charset=utf-8")],
            site.generator.atom_feed(&site.table),
        )
            .into_response()),
        Route::Stylesheet => {
            Ok(([(header::CONTENT_TYPE, "text/css; charset=utf-8")], STYLESHEET).into_response())
        }
        Route::File => return serve_file(&state, &site, request, &local, &decoded).await,
    };

    rendered.unwrap_or_else(render_error)
}

/// Serve a file from the source directory, or the not-found page
async fn serve_file(
    state: &ServerState,
    site: &Site,
    mut request: Request<Body>,
    local: &str,
    decoded: &str,
) -> Response {
    // ServeDir decodes the path itself, so check the decoded form
    let hidden = decoded
        .split('/')
        .any(|part| part.starts_with('_') || part.starts_with('.'));
    if hidden {
        return not_found(state, site);
    }

    match local.parse::<Uri>() {
        Ok(uri) => *request.uri_mut() = uri,
        Err(_) => return not_found(state, site),
    }

    let mut service = ServeDir::new(&site.generator.folio().source_dir);
    match service.try_call(request).await {
        Ok(response) if response.status() != StatusCode::NOT_FOUND => response.into_response(),
        Ok(_) => not_found(state, site),
        Err(e) => {
            tracing::error!("Static file error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
    }
}

fn not_found(state: &ServerState, site: &Site) -> Response {
    match site.generator.render_not_found() {
        Ok(html) => state.html(StatusCode::NOT_FOUND, html),
        Err(e) => render_error(e),
    }
}

fn render_error(e: anyhow::Error) -> Response {
    tracing::error!("Render failed: {:#}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, "Render error").into_response()
}

/// WebSocket handler for live reload
async fn livereload_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    let reload_rx = state.reload_tx.subscribe();
    ws.on_upgrade(move |socket| handle_livereload_socket(socket, reload_rx))
}

async fn handle_livereload_socket(mut socket: WebSocket, mut reload_rx: broadcast::Receiver<()>) {
    tracing::debug!("Live reload client connected");

    loop {
        tokio::select! {
            result = reload_rx.recv() => {
                match result {
                    Ok(_) => {
                        if socket.send(Message::Text("reload".to_string())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }

    tracing::debug!("Live reload client disconnected");
}

/// Inject live reload script into HTML content
fn inject_live_reload(html: &str) -> String {
    if html.contains("</body>") {
        html.replacen("</body>", LIVE_RELOAD_SCRIPT, 1)
    } else {
        format!("{}{}", html, LIVE_RELOAD_SCRIPT)
    }
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::init::init_site;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn app(live_reload: bool) -> (TempDir, Arc<ServerState>, Router) {
        let dir = TempDir::new().unwrap();
        init_site(dir.path()).unwrap();
        let state = ServerState::new(Site::load(dir.path()).unwrap(), live_reload);
        let router = router(Arc::clone(&state));
        (dir, state, router)
    }

    async fn get(router: Router, uri: &str) -> (StatusCode, String) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_known_post() {
        let (_dir, _state, router) = app(false);
        let (status, body) = get(router, "/blog/fastapi-cicd-pipeline").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Building a Complete CI/CD Pipeline for FastAPI on AWS"));
    }

    #[tokio::test]
    async fn test_trailing_slash() {
        let (_dir, _state, router) = app(false);
        let (status, _) = get(router, "/blog/langgraph-multi-agent/").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_post_is_404_page() {
        let (_dir, _state, router) = app(false);
        let (status, body) = get(router, "/blog/does-not-exist").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("<title>Post Not Found</title>"));
    }

    #[tokio::test]
    async fn test_slug_match_is_case_sensitive() {
        let (_dir, _state, router) = app(false);
        let (status, _) = get(router, "/blog/FastAPI-CICD-Pipeline").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_home_index_and_feed() {
        let (_dir, _state, router) = app(false);
        let (status, body) = get(router.clone(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Selected Works"));

        let (status, body) = get(router.clone(), "/blog").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("All Articles"));

        let (status, body) = get(router, "/atom.xml").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.starts_with("<?xml"));
    }

    #[tokio::test]
    async fn test_static_files_and_hidden_sources() {
        let (dir, _state, router) = app(false);
        std::fs::write(dir.path().join("source/images/logo.svg"), "<svg/>").unwrap();

        let (status, body) = get(router.clone(), "/images/logo.svg").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<svg/>");

        let (status, _) = get(router.clone(), "/_posts/01-fastapi-cicd-pipeline.md").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = get(router.clone(), "/%5Fposts/01-fastapi-cicd-pipeline.md").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = get(router, "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("This page could not be found."));
    }

    #[tokio::test]
    async fn test_live_reload_injected() {
        let (_dir, _state, router) = app(true);
        let (_, body) = get(router, "/").await;
        assert!(body.contains("__livereload"));
    }

    #[tokio::test]
    async fn test_replace_swaps_table() {
        let (dir, state, router) = app(false);
        std::fs::write(
            dir.path().join("source/_posts/05-new.md"),
            "---\nid: fresh-post\ntitle: Fresh\ndate: 2025-01-01\n---\nHi",
        )
        .unwrap();

        let (status, _) = get(router.clone(), "/blog/fresh-post").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let mut reload_rx = state.reload_tx.subscribe();
        state.replace(Site::load(dir.path()).unwrap());
        assert!(reload_rx.try_recv().is_ok());

        let (status, _) = get(router, "/blog/fresh-post").await;
        assert_eq!(status, StatusCode::OK);
    }

    fn rewrite_config(dir: &TempDir, from: &str, to: &str) {
        let path = dir.path().join(crate::CONFIG_FILE);
        let config = std::fs::read_to_string(&path).unwrap();
        assert!(config.contains(from));
        std::fs::write(&path, config.replace(from, to)).unwrap();
    }

    #[tokio::test]
    async fn test_routes_follow_reloaded_blog_dir() {
        let (dir, state, router) = app(false);
        rewrite_config(&dir, "blog_dir: blog", "blog_dir: writing");
        state.replace(Site::load(dir.path()).unwrap());

        let (status, _) = get(router.clone(), "/writing/fastapi-cicd-pipeline/").await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = get(router.clone(), "/writing").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("/writing/fastapi-cicd-pipeline/"));

        let (status, _) = get(router, "/blog/fastapi-cicd-pipeline/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_root_prefix() {
        let (dir, state, router) = app(false);
        rewrite_config(&dir, "root: /", "root: /portfolio/");
        state.replace(Site::load(dir.path()).unwrap());

        let (status, _) = get(router.clone(), "/portfolio").await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = get(router.clone(), "/portfolio/blog/langgraph-multi-agent").await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = get(router.clone(), "/portfolio/css/style.css").await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = get(router.clone(), "/blog/langgraph-multi-agent").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = get(router, "/portfolioblog").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_route() {
        assert_eq!(route("/", "blog"), Route::Home);
        assert_eq!(route("/atom.xml", "blog"), Route::Feed);
        assert_eq!(route("/blog", "blog"), Route::BlogIndex);
        assert_eq!(route("/blog/", "/blog/"), Route::BlogIndex);
        assert_eq!(route("/blog/a-post", "blog"), Route::Post("a-post"));
        assert_eq!(route("/blog/a-post/", "blog"), Route::Post("a-post"));
        assert_eq!(route("/blog/a-post/index.html", "blog"), Route::Post("a-post"));
        assert_eq!(route("/blog/a-post/cover.png", "blog"), Route::File);
        assert_eq!(route("/blogger", "blog"), Route::File);
        assert_eq!(route("/images/logo.svg", "blog"), Route::File);
    }

    #[test]
    fn test_strip_root() {
        assert_eq!(strip_root("/blog/a", "/"), Some("/blog/a"));
        assert_eq!(strip_root("/portfolio", "/portfolio/"), Some("/"));
        assert_eq!(strip_root("/portfolio/blog", "/portfolio/"), Some("/blog"));
        assert_eq!(strip_root("/portfolioblog", "/portfolio/"), None);
        assert_eq!(strip_root("/blog", "/portfolio/"), None);
    }

    #[test]
    fn test_inject_live_reload() {
        let html = "<html><body><p>x</p></body></html>";
        let injected = inject_live_reload(html);
        assert!(injected.contains("__livereload"));
        assert!(injected.ends_with("</html>"));
    }
}
