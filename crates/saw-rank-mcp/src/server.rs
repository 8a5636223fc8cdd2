use std::fs;
use std::future::Future;
use std::io::{self, BufRead, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use saw_rank_core::presenter::{
    render_matrix, render_normalized_matrix, render_ranking, render_weights,
};
use saw_rank_core::{
    classify, coerce_cell, field_for, rank, CriterionType, ImportedMatrix, RankingSession,
    ScoreRequest, ValidationError,
};
use saw_rank_remote::providers::LocalScoringProvider;
use saw_rank_remote::{
    build_catalog_provider, build_import_provider, build_scoring_provider, CatalogProvider,
    ImportProvider, ImportUpload, ProviderError, ScoreEnvelope, ScoringProvider,
};
use saw_rank_storage::{AhpWeights, PersistentWeightStore, StorageError, WeightsBackend};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::protocol::{
    JsonRpcRequest, JsonRpcResponse, EXTERNAL_FAILURE, INTERNAL_ERROR, INVALID_PARAMS,
    INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR, SESSION_UNAVAILABLE,
};

const DEFAULT_MCP_PROTOCOL_VERSION: &str = "2024-11-05";
const NO_WEIGHTS: &str = "No weights found. Please complete AHP weighting first.";

/// JSON-RPC front end for one ranking session.
///
/// The session exists only while a criteria/weights pair is stored; until
/// then every session tool answers with `SESSION_UNAVAILABLE`.
pub struct SawServer {
    weights: Mutex<Box<dyn WeightsBackend>>,
    session: Mutex<Option<RankingSession>>,
    scoring: Arc<dyn ScoringProvider>,
    catalog: Option<Arc<dyn CatalogProvider>>,
    importer: Option<Arc<dyn ImportProvider>>,
}

#[derive(Debug, Error)]
enum ToolError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Unavailable(&'static str),
    #[error("{0}")]
    External(String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ToolError {
    fn code(&self) -> i64 {
        match self {
            Self::Validation(_) | Self::InvalidArguments(_) => INVALID_PARAMS,
            Self::Unavailable(_) => SESSION_UNAVAILABLE,
            Self::External(_) => EXTERNAL_FAILURE,
            Self::Storage(_) => INTERNAL_ERROR,
        }
    }

    fn into_response(self, id: Value) -> JsonRpcResponse {
        JsonRpcResponse::error(id, self.code(), self.to_string())
    }
}

impl From<ProviderError> for ToolError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Validation(v) => Self::Validation(v),
            other => Self::External(provider_error_message(&other)),
        }
    }
}

struct ToolOutput {
    structured: Value,
    text: String,
}

impl ToolOutput {
    fn new(structured: Value, text: impl Into<String>) -> Self {
        Self {
            structured,
            text: text.into(),
        }
    }
}

type ToolResult = Result<ToolOutput, ToolError>;

impl SawServer {
    pub fn new() -> Result<Self, String> {
        Self::with_config(ServerConfig::from_env()?)
    }

    pub fn with_weights_path(path: impl Into<String>) -> Result<Self, String> {
        Self::with_config(ServerConfig::local(path))
    }

    pub fn with_config(config: ServerConfig) -> Result<Self, String> {
        let store =
            PersistentWeightStore::open(&config.weights_path).map_err(|e| e.to_string())?;
        let session = match store.load() {
            Some(w) => {
                Some(RankingSession::new(w.criteria, w.weights).map_err(|e| e.to_string())?)
            }
            None => {
                warn!(
                    path = %store.path().display(),
                    "no AHP weights stored; ranking disabled until saw_weights_set"
                );
                None
            }
        };

        let scoring =
            build_scoring_provider(config.scoring).map_err(|e| provider_error_message(&e))?;
        let catalog = config
            .catalog
            .map(build_catalog_provider)
            .transpose()
            .map_err(|e| provider_error_message(&e))?;
        let importer = config
            .import
            .map(build_import_provider)
            .transpose()
            .map_err(|e| provider_error_message(&e))?;

        info!(
            scoring = scoring.name(),
            catalog = catalog.is_some(),
            import = importer.is_some(),
            session_ready = session.is_some(),
            "saw-rank server initialized"
        );

        Ok(Self {
            weights: Mutex::new(Box::new(store)),
            session: Mutex::new(session),
            scoring,
            catalog,
            importer,
        })
    }

    pub fn session_ready(&self) -> bool {
        self.session.lock().is_some()
    }

    pub fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                request.id.unwrap_or(Value::Null),
                INVALID_REQUEST,
                "invalid jsonrpc version",
            ));
        }

        let is_notification = request.id.is_none();
        let id = request.id.clone().unwrap_or(Value::Null);

        if is_notification && request.method == "notifications/initialized" {
            return None;
        }

        let response = match request.method.as_str() {
            "initialize" => {
                let protocol_version = request
                    .params
                    .get("protocolVersion")
                    .and_then(Value::as_str)
                    .unwrap_or(DEFAULT_MCP_PROTOCOL_VERSION);
                JsonRpcResponse::success(
                    id,
                    json!({
                        "protocolVersion": protocol_version,
                        "serverInfo": {
                            "name": "saw-rank-mcp",
                            "version": env!("CARGO_PKG_VERSION")
                        },
                        "capabilities": {"tools": {"listChanged": false}}
                    }),
                )
            }
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(id, tools_list_result()),
            "tools/call" => self.handle_tools_call(id, request.params),
            _ => JsonRpcResponse::error(id, METHOD_NOT_FOUND, "method not found"),
        };

        Some(response)
    }

    fn handle_tools_call(&self, id: Value, params: Value) -> JsonRpcResponse {
        let parsed: ToolsCallParams = match serde_json::from_value(params) {
            Ok(v) => v,
            Err(err) => {
                return JsonRpcResponse::error(id, INVALID_PARAMS, format!("invalid params: {err}"));
            }
        };

        let args = parsed.arguments;
        let result = match parsed.name.as_str() {
            "saw_weights_get" => self.exec_weights_get(),
            "saw_weights_set" => self.exec_weights_set(args),
            "saw_weights_clear" => self.exec_weights_clear(),
            "saw_session_reset" => self.exec_session_reset(),
            "saw_alternative_add" => self.exec_alternative_add(args),
            "saw_alternative_remove" => self.exec_alternative_remove(args),
            "saw_alternatives_list" => self.exec_alternatives_list(),
            "saw_catalog_fetch" => self.exec_catalog_fetch(),
            "saw_catalog_lookup" => self.exec_catalog_lookup(args),
            "saw_classify" => self.exec_classify(args),
            "saw_matrix_generate" => self.exec_matrix_generate(),
            "saw_matrix_set_cell" => self.exec_matrix_set_cell(args),
            "saw_types_set" => self.exec_types_set(args),
            "saw_import" => self.exec_import(args),
            "saw_import_upload" => self.exec_import_upload(args),
            "saw_rank" => self.exec_rank(args),
            _ => return JsonRpcResponse::error(id, METHOD_NOT_FOUND, "unknown tool"),
        };

        match result {
            Ok(out) => JsonRpcResponse::tool_result(id, out.structured, out.text),
            Err(err) => {
                debug!(tool = %parsed.name, error = %err, "tool call failed");
                err.into_response(id)
            }
        }
    }

    fn with_session<T>(
        &self,
        f: impl FnOnce(&mut RankingSession) -> Result<T, ToolError>,
    ) -> Result<T, ToolError> {
        let mut guard = self.session.lock();
        let session = guard.as_mut().ok_or(ToolError::Unavailable(NO_WEIGHTS))?;
        f(session)
    }

    fn exec_weights_get(&self) -> ToolResult {
        self.with_session(|s| {
            let sum = s.weights().iter().sum::<f64>();
            Ok(ToolOutput::new(
                json!({
                    "criteria": s.criteria(),
                    "weights": s.weights(),
                    "weight_sum": sum,
                }),
                render_weights(s.criteria(), s.weights()),
            ))
        })
    }

    fn exec_weights_set(&self, arguments: Option<Value>) -> ToolResult {
        let args: WeightsSetInput = parse_args(arguments)?;
        let pair = AhpWeights::new(args.criteria, args.weights).map_err(storage_input_error)?;
        let session = RankingSession::new(pair.criteria.clone(), pair.weights.clone())?;

        self.weights.lock().save(pair).map_err(storage_input_error)?;
        let text = render_weights(session.criteria(), session.weights());
        let structured = json!({
            "criteria": session.criteria(),
            "weights": session.weights(),
        });
        *self.session.lock() = Some(session);
        info!("AHP weights stored; session restarted");
        Ok(ToolOutput::new(structured, text))
    }

    fn exec_weights_clear(&self) -> ToolResult {
        self.weights.lock().clear()?;
        *self.session.lock() = None;
        info!("AHP weights cleared; ranking disabled");
        Ok(ToolOutput::new(json!({"cleared": true}), "weights cleared"))
    }

    fn exec_session_reset(&self) -> ToolResult {
        let loaded = self.weights.lock().load();
        let session = loaded
            .map(|w| RankingSession::new(w.criteria, w.weights))
            .transpose()?;
        let ready = session.is_some();
        *self.session.lock() = session;
        if !ready {
            return Err(ToolError::Unavailable(NO_WEIGHTS));
        }
        Ok(ToolOutput::new(json!({"ready": true}), "session reset"))
    }

    fn exec_alternative_add(&self, arguments: Option<Value>) -> ToolResult {
        let args: NameInput = parse_args(arguments)?;
        self.with_session(|s| {
            s.add_alternative(&args.name)?;
            Ok(alternatives_output(s, format!("added {}", args.name.trim())))
        })
    }

    fn exec_alternative_remove(&self, arguments: Option<Value>) -> ToolResult {
        let args: NameInput = parse_args(arguments)?;
        self.with_session(|s| {
            s.remove_alternative(&args.name)?;
            Ok(alternatives_output(s, format!("removed {}", args.name.trim())))
        })
    }

    fn exec_alternatives_list(&self) -> ToolResult {
        self.with_session(|s| {
            let text = s.alternatives().join("\n");
            Ok(alternatives_output(s, text))
        })
    }

    fn exec_catalog_fetch(&self) -> ToolResult {
        let catalog = self.catalog_provider()?;
        self.with_session(|_| Ok(()))?;

        let records = block_on(async { catalog.list().await })??;
        self.with_session(|s| {
            let count = s.replace_with_catalog(records);
            info!(count, "catalog loaded into session");
            Ok(alternatives_output(
                s,
                format!("Successfully loaded {count} games from the catalog"),
            ))
        })
    }

    fn exec_catalog_lookup(&self, arguments: Option<Value>) -> ToolResult {
        let args: CatalogLookupInput = parse_args(arguments)?;
        let catalog = self.catalog_provider()?;
        self.with_session(|_| Ok(()))?;

        let record = block_on(async { catalog.lookup(&args.app_id).await })??;
        self.with_session(|s| {
            let name = s.add_catalog_record(record)?;
            Ok(alternatives_output(s, format!("added {name}")))
        })
    }

    fn exec_classify(&self, arguments: Option<Value>) -> ToolResult {
        let args: ClassifyInput = parse_args_optional(arguments)?;
        let criteria = match args.criteria {
            Some(c) => c,
            None => self.with_session(|s| Ok(s.criteria().to_vec()))?,
        };

        let rows = criteria
            .iter()
            .map(|c| {
                json!({
                    "criterion": c,
                    "type": classify(c),
                    "autofill_field": field_for(c).map(|f| f.as_str()),
                })
            })
            .collect::<Vec<_>>();
        let text = criteria
            .iter()
            .map(|c| format!("{c}: {}", classify(c)))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(ToolOutput::new(json!({"criteria": rows}), text))
    }

    fn exec_matrix_generate(&self) -> ToolResult {
        self.with_session(|s| {
            s.generate_matrix()?;
            Ok(matrix_output(s, "Decision Matrix"))
        })
    }

    fn exec_matrix_set_cell(&self, arguments: Option<Value>) -> ToolResult {
        let args: SetCellInput = parse_args(arguments)?;
        self.with_session(|s| {
            let stored = match &args.value {
                Value::Number(n) => {
                    let v = n.as_f64().unwrap_or(0.0);
                    s.set_cell_value(args.row, args.column, v)?;
                    s.matrix()
                        .and_then(|m| m.get(args.row, args.column))
                        .unwrap_or(0.0)
                }
                Value::String(raw) => s.set_cell(args.row, args.column, raw)?,
                _ => s.set_cell(args.row, args.column, "")?,
            };
            Ok(ToolOutput::new(
                json!({"row": args.row, "column": args.column, "value": stored}),
                format!("cell ({}, {}) = {stored}", args.row, args.column),
            ))
        })
    }

    fn exec_types_set(&self, arguments: Option<Value>) -> ToolResult {
        let args: TypesSetInput = parse_args(arguments)?;
        self.with_session(|s| {
            if let Some(raw) = args.types {
                let types = raw
                    .iter()
                    .map(|t| t.parse::<CriterionType>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(ToolError::InvalidArguments)?;
                s.set_types(types)?;
            } else {
                let (Some(column), Some(raw)) = (args.column, args.kind) else {
                    return Err(ToolError::InvalidArguments(
                        "provide either types or column and type".to_string(),
                    ));
                };
                let kind = raw
                    .parse::<CriterionType>()
                    .map_err(ToolError::InvalidArguments)?;
                s.set_type(column, kind)?;
            }
            let text = s
                .criteria()
                .iter()
                .zip(s.types())
                .map(|(c, t)| format!("{c}: {t}"))
                .collect::<Vec<_>>()
                .join("\n");
            Ok(ToolOutput::new(
                json!({"criteria": s.criteria(), "criteria_types": s.types()}),
                text,
            ))
        })
    }

    fn exec_import(&self, arguments: Option<Value>) -> ToolResult {
        let args: ImportInput = parse_args(arguments)?;
        let imported = ImportedMatrix {
            criteria: args.criteria,
            alternatives: args.alternatives,
            decision_matrix: args
                .decision_matrix
                .iter()
                .map(|row| row.iter().map(value_to_cell).collect())
                .collect(),
        };
        self.apply_import(imported)
    }

    fn exec_import_upload(&self, arguments: Option<Value>) -> ToolResult {
        let args: ImportUploadInput = parse_args(arguments)?;
        let importer = self.importer.clone().ok_or_else(|| {
            ToolError::External(
                "import parser not configured (set SAW_IMPORT_ENDPOINT)".to_string(),
            )
        })?;
        self.with_session(|_| Ok(()))?;

        let path = Path::new(&args.file_path);
        let bytes = fs::read(path).map_err(|e| {
            ToolError::InvalidArguments(format!("cannot read {}: {e}", path.display()))
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.xlsx".to_string());

        let imported =
            block_on(async { importer.upload(ImportUpload { file_name, bytes }).await })??;
        self.apply_import(imported)
    }

    fn apply_import(&self, imported: ImportedMatrix) -> ToolResult {
        self.with_session(|s| {
            let count = s.apply_import(imported)?;
            let mut out = matrix_output(s, "Decision Matrix");
            out.text = format!("Successfully imported {count} alternatives.\n{}", out.text);
            Ok(out)
        })
    }

    fn exec_rank(&self, arguments: Option<Value>) -> ToolResult {
        let args: RankInput = parse_args_optional(arguments)?;
        let request = self.with_session(|s| Ok(s.score_request()?))?;

        let provider: Arc<dyn ScoringProvider> = if args.local.unwrap_or(false) {
            Arc::new(LocalScoringProvider)
        } else {
            self.scoring.clone()
        };
        let name = provider.name();
        let alternatives = request.alternatives.clone();
        let criteria = request.criteria.clone();
        let outcome = block_on(async { provider.score(request).await })??;
        info!(provider = name, alternatives = alternatives.len(), "ranking computed");

        let text = format!(
            "{}\n{}",
            render_ranking(&outcome),
            render_normalized_matrix(&alternatives, &criteria, &outcome.normalized_matrix)
        );
        Ok(ToolOutput::new(
            json!({
                "provider": name,
                "ranking": outcome.ranking,
                "normalized_matrix": outcome.normalized_matrix,
            }),
            text,
        ))
    }

    fn catalog_provider(&self) -> Result<Arc<dyn CatalogProvider>, ToolError> {
        self.catalog.clone().ok_or_else(|| {
            ToolError::External(
                "catalog source not configured (set SAW_CATALOG_BASE_URL)".to_string(),
            )
        })
    }

    /// Serve the remote scoring contract with the in-process engine.
    pub fn calculate(&self, body: &[u8]) -> (u16, ScoreEnvelope) {
        let request: ScoreRequest = match serde_json::from_slice(body) {
            Ok(v) => v,
            Err(err) => {
                return (
                    400,
                    ScoreEnvelope::failure(format!("invalid scoring request: {err}")),
                )
            }
        };
        match rank(&request) {
            Ok(outcome) => (200, ScoreEnvelope::ok(outcome)),
            Err(err) => (400, ScoreEnvelope::failure(err.to_string())),
        }
    }

    pub fn serve_stdio(&self) -> io::Result<()> {
        let stdin = io::stdin();
        let mut reader = io::BufReader::new(stdin.lock());
        let mut stdout = io::stdout();

        while let Some(input) = read_stdio_frame(&mut reader)? {
            let (payload, frame) = match input {
                StdioInput::Payload(payload, frame) => (payload, frame),
                StdioInput::Refused(reason, frame) => {
                    warn!(reason = %reason, "stdio frame refused");
                    let response = JsonRpcResponse::error(Value::Null, PARSE_ERROR, reason);
                    write_stdio_response(&mut stdout, &response, frame)?;
                    continue;
                }
            };

            let response = match serde_json::from_slice::<JsonRpcRequest>(&payload) {
                Ok(request) => self.handle_request(request),
                Err(err) => Some(JsonRpcResponse::error(
                    Value::Null,
                    PARSE_ERROR,
                    format!("parse error: {err}"),
                )),
            };
            if let Some(response) = response {
                write_stdio_response(&mut stdout, &response, frame)?;
            }
        }

        Ok(())
    }

    pub fn serve_http(&self, addr: &str) -> io::Result<()> {
        let listener = TcpListener::bind(addr)?;
        info!(addr = %listener.local_addr()?, "saw-rank http listening");
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    if let Err(err) = self.handle_http_connection(stream) {
                        warn!(error = %err, "http request error");
                    }
                }
                Err(err) => warn!(error = %err, "http accept error"),
            }
        }
        Ok(())
    }

    fn handle_http_connection(&self, mut stream: TcpStream) -> io::Result<()> {
        let response = match read_http_request(&stream)? {
            None => return Ok(()),
            Some(Incoming::Rejected(reason)) => {
                warn!(reason = %reason, "http request refused");
                HttpResponse::json(400, &json!({"error": "bad_request", "message": reason}))
            }
            Some(Incoming::Request(req)) => {
                debug!(method = %req.method, path = %req.path, "http request");
                self.dispatch_http_request(&req)
            }
        };
        write_http_response(&mut stream, &response)
    }

    fn dispatch_http_request(&self, req: &HttpRequest) -> HttpResponse {
        match (req.method.as_str(), req.path.as_str()) {
            ("GET", "/health") => HttpResponse::json(
                200,
                &json!({
                    "status": "ok",
                    "session_ready": self.session_ready(),
                    "weights_store": self.weights.lock().stats(),
                }),
            ),
            ("POST", "/calculate_saw") => {
                let (status, envelope) = self.calculate(&req.body);
                match serde_json::to_value(envelope) {
                    Ok(v) => HttpResponse::json(status, &v),
                    Err(_) => HttpResponse::json(
                        500,
                        &json!({"success": false, "error": "failed to serialize ranking"}),
                    ),
                }
            }
            ("POST", "/mcp") => self.dispatch_rpc_body(&req.body),
            (_, "/health" | "/calculate_saw" | "/mcp") => HttpResponse::json(
                405,
                &json!({
                    "error": "method_not_allowed",
                    "message": format!("{} not allowed", req.method)
                }),
            ),
            _ => HttpResponse::json(
                404,
                &json!({"error": "not_found", "message": format!("no route for {}", req.path)}),
            ),
        }
    }

    fn dispatch_rpc_body(&self, body: &[u8]) -> HttpResponse {
        let rpc: JsonRpcRequest = match serde_json::from_slice(body) {
            Ok(v) => v,
            Err(err) => {
                return HttpResponse::json(
                    400,
                    &json!({
                        "jsonrpc": "2.0",
                        "id": Value::Null,
                        "error": {"code": PARSE_ERROR, "message": format!("parse error: {err}")}
                    }),
                )
            }
        };
        match self.handle_request(rpc) {
            Some(v) => match serde_json::to_value(v) {
                Ok(payload) => HttpResponse::json(200, &payload),
                Err(_) => HttpResponse::json(
                    500,
                    &json!({
                        "error": "internal_error",
                        "message": "failed to serialize rpc response"
                    }),
                ),
            },
            None => HttpResponse::empty(204),
        }
    }
}

fn alternatives_output(session: &RankingSession, text: impl Into<String>) -> ToolOutput {
    let with_metadata = session
        .alternatives()
        .iter()
        .filter(|a| session.metadata_for(a).is_some())
        .collect::<Vec<_>>();
    ToolOutput::new(
        json!({
            "alternatives": session.alternatives(),
            "with_metadata": with_metadata,
            "matrix_ready": session.matrix().is_some(),
        }),
        text,
    )
}

fn matrix_output(session: &RankingSession, title: &str) -> ToolOutput {
    let rows = session
        .matrix()
        .map(|m| m.rows().to_vec())
        .unwrap_or_default();
    let text = render_matrix(title, session.alternatives(), session.criteria(), &rows);
    ToolOutput::new(
        json!({
            "alternatives": session.alternatives(),
            "criteria": session.criteria(),
            "decision_matrix": rows,
            "criteria_types": session.types(),
        }),
        text,
    )
}

fn value_to_cell(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => coerce_cell(s),
        _ => 0.0,
    }
}

fn storage_input_error(err: StorageError) -> ToolError {
    match err {
        StorageError::InvalidInput(msg) => ToolError::InvalidArguments(msg),
        other => ToolError::Storage(other),
    }
}

/// Run one provider call to completion on a throwaway runtime.
fn block_on<F: Future>(fut: F) -> Result<F::Output, ToolError> {
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| ToolError::External(format!("runtime initialization failed: {e}")))?;
    Ok(rt.block_on(fut))
}

fn provider_error_message(err: &ProviderError) -> String {
    match err {
        ProviderError::Config(msg) => format!("Configuration error: {}", sanitize_sensitive(msg)),
        ProviderError::Http(e) => format!("Network error: {}", sanitize_sensitive(&e.to_string())),
        ProviderError::Serde(e) => {
            format!("Serialization error: {}", sanitize_sensitive(&e.to_string()))
        }
        ProviderError::InvalidResponse(msg) => {
            format!("Invalid provider response: {}", sanitize_sensitive(msg))
        }
        ProviderError::Api { status, body } => format!(
            "Provider API error (status {status}): {}",
            sanitize_sensitive(body)
        ),
        ProviderError::Remote(msg) => sanitize_sensitive(msg),
        ProviderError::Validation(v) => v.to_string(),
    }
}

fn sanitize_sensitive(input: &str) -> String {
    let mut out = input.to_string();
    if let Ok(secret) = std::env::var("SAW_REMOTE_API_KEY") {
        if !secret.is_empty() {
            out = out.replace(&secret, "[REDACTED]");
        }
    }
    for marker in ["key=", "token="] {
        out = redact_query_param(&out, marker);
    }
    out
}

fn redact_query_param(input: &str, marker: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find(marker) {
        let (head, tail) = rest.split_at(pos + marker.len());
        out.push_str(head);
        out.push_str("[REDACTED]");
        let end = tail
            .find(|c: char| c == '&' || c == ' ' || c == '"' || c == ')')
            .unwrap_or(tail.len());
        rest = tail.get(end..).unwrap_or_default();
    }
    out.push_str(rest);
    out
}

#[derive(Debug, Deserialize)]
struct ToolsCallParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct WeightsSetInput {
    criteria: Vec<String>,
    weights: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct NameInput {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CatalogLookupInput {
    app_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct ClassifyInput {
    criteria: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct SetCellInput {
    row: usize,
    column: usize,
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Deserialize)]
struct TypesSetInput {
    types: Option<Vec<String>>,
    column: Option<usize>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImportInput {
    #[serde(alias = "criteria_from_file")]
    criteria: Vec<String>,
    alternatives: Vec<String>,
    #[serde(default)]
    decision_matrix: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct ImportUploadInput {
    file_path: String,
}

#[derive(Debug, Default, Deserialize)]
struct RankInput {
    local: Option<bool>,
}

fn parse_args<T: for<'de> Deserialize<'de>>(arguments: Option<Value>) -> Result<T, ToolError> {
    let args = arguments
        .ok_or_else(|| ToolError::InvalidArguments("missing tool arguments".to_string()))?;
    serde_json::from_value(args)
        .map_err(|err| ToolError::InvalidArguments(format!("invalid tool arguments: {err}")))
}

fn parse_args_optional<T: for<'de> Deserialize<'de> + Default>(
    arguments: Option<Value>,
) -> Result<T, ToolError> {
    match arguments {
        Some(Value::Null) | None => Ok(T::default()),
        Some(v) => serde_json::from_value(v)
            .map_err(|err| ToolError::InvalidArguments(format!("invalid tool arguments: {err}"))),
    }
}

fn tools_list_result() -> Value {
    let string_list = json!({"type": "array", "items": {"type": "string"}});
    json!({
        "tools": [
            {
                "name": "saw_weights_get",
                "description": "Show the AHP criteria and weights the session ranks with.",
                "inputSchema": {"type": "object", "properties": {}}
            },
            {
                "name": "saw_weights_set",
                "description": "Store a criteria/weights pair from the AHP step and restart the session.",
                "inputSchema": {
                    "type": "object",
                    "required": ["criteria", "weights"],
                    "properties": {
                        "criteria": string_list,
                        "weights": {"type": "array", "items": {"type": "number"}}
                    }
                }
            },
            {
                "name": "saw_weights_clear",
                "description": "Forget the stored criteria/weights; session tools stay unavailable until set again.",
                "inputSchema": {"type": "object", "properties": {}}
            },
            {
                "name": "saw_session_reset",
                "description": "Reload stored weights and start an empty session.",
                "inputSchema": {"type": "object", "properties": {}}
            },
            {
                "name": "saw_alternative_add",
                "description": "Add an alternative by name. Names are trimmed and must be unique.",
                "inputSchema": {
                    "type": "object",
                    "required": ["name"],
                    "properties": {"name": {"type": "string"}}
                }
            },
            {
                "name": "saw_alternative_remove",
                "description": "Remove an alternative by name.",
                "inputSchema": {
                    "type": "object",
                    "required": ["name"],
                    "properties": {"name": {"type": "string"}}
                }
            },
            {
                "name": "saw_alternatives_list",
                "description": "List the session's alternatives.",
                "inputSchema": {"type": "object", "properties": {}}
            },
            {
                "name": "saw_catalog_fetch",
                "description": "Replace the alternatives with the default catalog list and its metadata.",
                "inputSchema": {"type": "object", "properties": {}}
            },
            {
                "name": "saw_catalog_lookup",
                "description": "Add one catalog entry by app id, with its metadata for autofill.",
                "inputSchema": {
                    "type": "object",
                    "required": ["app_id"],
                    "properties": {"app_id": {"type": "string"}}
                }
            },
            {
                "name": "saw_classify",
                "description": "Guess benefit/cost and the autofill field for criterion names.",
                "inputSchema": {
                    "type": "object",
                    "properties": {"criteria": string_list}
                }
            },
            {
                "name": "saw_matrix_generate",
                "description": "Build the decision matrix from metadata defaults; needs at least 2 alternatives.",
                "inputSchema": {"type": "object", "properties": {}}
            },
            {
                "name": "saw_matrix_set_cell",
                "description": "Overwrite one decision matrix cell. Unparseable values become 0.",
                "inputSchema": {
                    "type": "object",
                    "required": ["row", "column", "value"],
                    "properties": {
                        "row": {"type": "integer"},
                        "column": {"type": "integer"},
                        "value": {"type": ["number", "string"]}
                    }
                }
            },
            {
                "name": "saw_types_set",
                "description": "Confirm criterion types: all at once via types, or one via column and type.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "types": {
                            "type": "array",
                            "items": {"type": "string", "enum": ["benefit", "cost"]}
                        },
                        "column": {"type": "integer"},
                        "type": {"type": "string", "enum": ["benefit", "cost"]}
                    }
                }
            },
            {
                "name": "saw_import",
                "description": "Replace alternatives and matrix with parsed import data; criteria must match exactly and in order.",
                "inputSchema": {
                    "type": "object",
                    "required": ["criteria", "alternatives", "decision_matrix"],
                    "properties": {
                        "criteria": string_list,
                        "alternatives": string_list,
                        "decision_matrix": {"type": "array", "items": {"type": "array"}}
                    }
                }
            },
            {
                "name": "saw_import_upload",
                "description": "Send a spreadsheet to the import parser, then apply it like saw_import.",
                "inputSchema": {
                    "type": "object",
                    "required": ["file_path"],
                    "properties": {"file_path": {"type": "string"}}
                }
            },
            {
                "name": "saw_rank",
                "description": "Normalize the matrix and rank alternatives with SAW.",
                "inputSchema": {
                    "type": "object",
                    "properties": {"local": {"type": "boolean"}}
                }
            }
        ]
    })
}

struct HttpRequest {
    method: String,
    path: String,
    body: Vec<u8>,
}

struct HttpResponse {
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
}

impl HttpResponse {
    fn json(status: u16, value: &Value) -> Self {
        let body = serde_json::to_vec(value).unwrap_or_else(|_| b"{}".to_vec());
        Self {
            status,
            content_type: "application/json",
            body,
        }
    }

    const fn empty(status: u16) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: Vec::new(),
        }
    }
}

/// A parsed request, or the reason it was refused before the body was read.
enum Incoming {
    Request(HttpRequest),
    Rejected(String),
}

fn read_http_request(stream: &TcpStream) -> io::Result<Option<Incoming>> {
    let mut reader = io::BufReader::new(stream.try_clone()?);
    let mut request_line = String::new();
    if reader.read_line(&mut request_line)? == 0 {
        return Ok(None);
    }
    let mut parts = request_line.split_whitespace();
    let Some(method) = parts.next() else {
        return Ok(None);
    };
    let Some(target) = parts.next() else {
        return Ok(Some(Incoming::Rejected("malformed request line".to_string())));
    };
    let path = target.split('?').next().unwrap_or(target).to_string();

    let mut declared = None;
    for header in read_header_block(&mut reader)? {
        if let Some(value) = content_length_value(&header) {
            declared = Some(value.to_string());
        }
    }
    let length = match declared.as_deref().map(body_length).transpose() {
        Ok(length) => length.unwrap_or(0),
        Err(reason) => return Ok(Some(Incoming::Rejected(reason))),
    };

    let mut body = vec![0_u8; length];
    reader.read_exact(&mut body)?;
    Ok(Some(Incoming::Request(HttpRequest {
        method: method.to_string(),
        path,
        body,
    })))
}

fn write_http_response(stream: &mut TcpStream, response: &HttpResponse) -> io::Result<()> {
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        http_reason_phrase(response.status),
        response.content_type,
        response.body.len()
    );
    stream.write_all(head.as_bytes())?;
    stream.write_all(&response.body)?;
    stream.flush()
}

const fn http_reason_phrase(status: u16) -> &'static str {
    match status {
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "OK",
    }
}

/// Largest request body accepted on either transport.
const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Validate a declared `Content-Length` against `MAX_BODY_BYTES`.
fn body_length(raw: &str) -> Result<usize, String> {
    let declared = raw
        .trim()
        .parse::<u64>()
        .map_err(|_| format!("invalid content-length '{}'", raw.trim()))?;
    usize::try_from(declared)
        .ok()
        .filter(|len| *len <= MAX_BODY_BYTES)
        .ok_or_else(|| {
            format!("request body of {declared} bytes exceeds the {MAX_BODY_BYTES} byte limit")
        })
}

/// Header lines up to the blank separator line (or end of input).
fn read_header_block<R: BufRead>(reader: &mut R) -> io::Result<Vec<String>> {
    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Ok(headers);
        }
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return Ok(headers);
        }
        headers.push(line.to_string());
    }
}

fn content_length_value(header: &str) -> Option<&str> {
    let (name, value) = header.split_once(':')?;
    name.trim()
        .eq_ignore_ascii_case("content-length")
        .then_some(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StdioFrame {
    LineDelimited,
    ContentLength,
}

/// One unit read from stdin. `Refused` carries the parse error to answer with.
#[derive(Debug)]
enum StdioInput {
    Payload(Vec<u8>, StdioFrame),
    Refused(String, StdioFrame),
}

/// Next request from stdin, either a single JSON line or a `Content-Length`
/// framed body. `None` at end of input.
fn read_stdio_frame<R: BufRead>(reader: &mut R) -> io::Result<Option<StdioInput>> {
    let mut first = String::new();
    loop {
        first.clear();
        if reader.read_line(&mut first)? == 0 {
            return Ok(None);
        }
        if !first.trim().is_empty() {
            break;
        }
    }
    let first = first.trim();
    let lowered = first.to_ascii_lowercase();
    if !lowered.starts_with("content-length:") && !lowered.starts_with("content-type:") {
        return Ok(Some(StdioInput::Payload(
            first.as_bytes().to_vec(),
            StdioFrame::LineDelimited,
        )));
    }

    let mut declared = content_length_value(first).map(str::to_string);
    for header in read_header_block(reader)? {
        if let Some(value) = content_length_value(&header) {
            declared = Some(value.to_string());
        }
    }
    let framed = StdioFrame::ContentLength;
    let Some(raw) = declared else {
        return Ok(Some(StdioInput::Refused(
            "stdio frame has no content-length header".to_string(),
            framed,
        )));
    };

    let length = match body_length(&raw) {
        Ok(length) => length,
        Err(reason) => {
            // Skip the announced body so the next frame starts in the right place.
            if let Ok(skip) = raw.trim().parse::<u64>() {
                io::copy(&mut reader.take(skip), &mut io::sink())?;
            }
            return Ok(Some(StdioInput::Refused(reason, framed)));
        }
    };
    let mut body = vec![0_u8; length];
    Ok(Some(match reader.read_exact(&mut body) {
        Ok(()) => StdioInput::Payload(body, framed),
        Err(err) => StdioInput::Refused(format!("truncated stdio frame body: {err}"), framed),
    }))
}

fn write_stdio_response(
    stdout: &mut io::Stdout,
    response: &JsonRpcResponse,
    frame: StdioFrame,
) -> io::Result<()> {
    let serialized = serde_json::to_vec(response)?;
    if frame == StdioFrame::ContentLength {
        write!(stdout, "Content-Length: {}\r\n\r\n", serialized.len())?;
        stdout.write_all(&serialized)?;
    } else {
        stdout.write_all(&serialized)?;
        stdout.write_all(b"\n")?;
    }
    stdout.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_secrets_are_redacted() {
        let out = sanitize_sensitive("GET https://x.test/a?key=abc123&b=1 failed");
        assert_eq!(out, "GET https://x.test/a?key=[REDACTED]&b=1 failed");
        let out = sanitize_sensitive("token=zzz");
        assert_eq!(out, "token=[REDACTED]");
    }

    fn next_input(reader: &mut impl BufRead) -> StdioInput {
        read_stdio_frame(reader).expect("io").expect("input")
    }

    #[test]
    fn stdio_frames_parse_both_framings() {
        let raw = b"{\"a\":1}\n\nContent-Length: 7\r\nContent-Type: application/json\r\n\r\n{\"b\":2}";
        let mut reader = io::BufReader::new(&raw[..]);

        match next_input(&mut reader) {
            StdioInput::Payload(body, StdioFrame::LineDelimited) => assert_eq!(body, b"{\"a\":1}"),
            other => panic!("expected line payload, got {other:?}"),
        }
        match next_input(&mut reader) {
            StdioInput::Payload(body, StdioFrame::ContentLength) => assert_eq!(body, b"{\"b\":2}"),
            other => panic!("expected framed payload, got {other:?}"),
        }
        assert!(read_stdio_frame(&mut reader).expect("io").is_none());
    }

    #[test]
    fn oversized_stdio_frame_is_refused_and_skipped() {
        let raw = b"Content-Length: 18446744073709551615\r\n\r\n{}";
        let mut reader = io::BufReader::new(&raw[..]);
        match next_input(&mut reader) {
            StdioInput::Refused(reason, StdioFrame::ContentLength) => {
                assert!(reason.contains("byte limit"), "{reason}");
            }
            other => panic!("expected refusal, got {other:?}"),
        }
        assert!(read_stdio_frame(&mut reader).expect("io").is_none());

        let over = MAX_BODY_BYTES + 1;
        let raw = format!("Content-Length: {over}\r\n\r\n");
        let mut reader = io::BufReader::new(raw.as_bytes());
        assert!(matches!(
            next_input(&mut reader),
            StdioInput::Refused(_, StdioFrame::ContentLength)
        ));
    }

    #[test]
    fn malformed_stdio_headers_are_refused() {
        let mut reader = io::BufReader::new(&b"Content-Type: application/json\r\n\r\n"[..]);
        assert!(matches!(next_input(&mut reader), StdioInput::Refused(_, _)));

        let mut reader = io::BufReader::new(&b"Content-Length: lots\r\n\r\n"[..]);
        match next_input(&mut reader) {
            StdioInput::Refused(reason, _) => assert!(reason.contains("invalid content-length")),
            other => panic!("expected refusal, got {other:?}"),
        }

        let mut reader = io::BufReader::new(&b"Content-Length: 10\r\n\r\n{}"[..]);
        assert!(matches!(next_input(&mut reader), StdioInput::Refused(_, _)));
    }

    #[test]
    fn body_length_enforces_limit() {
        assert_eq!(body_length(" 42 "), Ok(42));
        assert_eq!(body_length(&MAX_BODY_BYTES.to_string()), Ok(MAX_BODY_BYTES));
        assert!(body_length(&(MAX_BODY_BYTES + 1).to_string()).is_err());
        assert!(body_length("-1").is_err());
        assert!(body_length("99999999999999999999999").is_err());
    }

    #[test]
    fn import_cells_coerce_like_manual_entry() {
        assert_eq!(value_to_cell(&json!(4.5)), 4.5);
        assert_eq!(value_to_cell(&json!("12")), 12.0);
        assert_eq!(value_to_cell(&json!("n/a")), 0.0);
        assert_eq!(value_to_cell(&Value::Null), 0.0);
    }
}
