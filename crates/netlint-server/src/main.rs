use anyhow::Result;
use netlint_core::config::{
    config_in_path_or_default, discover_config_with_workspace_or_default, NetlintConfig,
    RuleSeverity,
};
use netlint_core::linter::{lint, RuleResult};
use netlint_core::parser::{ParserOptions, Source};
use netlint_core::rules::rule_by_id;
use std::env;
use std::path::PathBuf;
use tokio::io::{stdin, stdout};
use tower_lsp::jsonrpc;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};

#[derive(Debug)]
struct Backend {
    client: Client,
    workspace_roots: std::sync::Mutex<Vec<PathBuf>>,
}

impl Backend {
    fn new(client: Client) -> Self {
        Self {
            client,
            workspace_roots: std::sync::Mutex::new(Vec::new()),
        }
    }

    fn lint_document(&self, uri: &Url, content: &str, source: Source) -> Result<Vec<Diagnostic>> {
        let file_path = uri
            .to_file_path()
            .map_err(|_| anyhow::anyhow!("Invalid file path"))?;

        let config = {
            let workspace_roots = self.workspace_roots.lock().unwrap();
            if workspace_roots.is_empty() {
                let pwd = env::current_dir()?;
                config_in_path_or_default(&pwd)?
            } else {
                discover_config_with_workspace_or_default(&file_path, workspace_roots.clone())?
            }
        };

        let options = ParserOptions {
            source,
            ..ParserOptions::default()
        };
        let results = lint(content, &config, &options);

        Ok(results
            .into_iter()
            .filter(|result| !result.passed)
            .map(|result| result_to_diagnostic(result, &config))
            .collect())
    }

    async fn publish_diagnostics(&self, uri: Url, content: &str, source: Source) {
        match self.lint_document(&uri, content, source) {
            Ok(diagnostics) => {
                self.client
                    .publish_diagnostics(uri, diagnostics, None)
                    .await;
            }
            Err(err) => {
                eprintln!("Failed to lint document: {err}");
            }
        }
    }
}

fn result_to_diagnostic(result: RuleResult, config: &NetlintConfig) -> Diagnostic {
    let alias = rule_by_id(&result.rule_id).map_or("unknown", |rule| rule.alias);

    let severity = match config.severity_for(alias) {
        RuleSeverity::Error => DiagnosticSeverity::ERROR,
        RuleSeverity::Warning => DiagnosticSeverity::WARNING,
        RuleSeverity::Info => DiagnosticSeverity::INFORMATION,
        // Shouldn't happen since off rules are filtered before the run
        RuleSeverity::Off => DiagnosticSeverity::HINT,
    };

    Diagnostic {
        // cover the node's whole span; the end position is the start of the
        // line after the last covered line
        range: Range {
            start: Position {
                line: result.loc.start_line,
                character: 0,
            },
            end: Position {
                line: result.loc.end_line + 1,
                character: 0,
            },
        },
        severity: Some(severity),
        code: Some(NumberOrString::String(alias.to_string())),
        source: Some("netlint".to_string()),
        message: result.message.clone(),
        related_information: None,
        tags: None,
        code_description: None,
        data: result
            .remediation
            .as_ref()
            .map(|remediation| serde_json::json!({ "remediation": remediation })),
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> jsonrpc::Result<InitializeResult> {
        eprintln!("LSP server initializing with params: {:?}", params.root_uri);

        let mut workspace_roots = Vec::new();

        // Priority 1: workspace_folders from params
        if let Some(folders) = params.workspace_folders {
            for folder in folders {
                if let Ok(path) = folder.uri.to_file_path() {
                    workspace_roots.push(path);
                }
            }
        }

        // Priority 2: root_uri as fallback
        if workspace_roots.is_empty() {
            if let Some(root_uri) = params.root_uri {
                if let Ok(path) = root_uri.to_file_path() {
                    workspace_roots.push(path);
                }
            }
        }

        {
            let mut stored_roots = self.workspace_roots.lock().unwrap();
            *stored_roots = workspace_roots.clone();
        }

        eprintln!("Workspace roots configured: {workspace_roots:?}");

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::FULL),
                        will_save: Some(false),
                        will_save_wait_until: Some(false),
                        save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                            include_text: Some(true),
                        })),
                    },
                )),
                diagnostic_provider: Some(DiagnosticServerCapabilities::Options(
                    DiagnosticOptions {
                        identifier: Some("netlint".to_string()),
                        inter_file_dependencies: false,
                        workspace_diagnostics: false,
                        work_done_progress_options: WorkDoneProgressOptions::default(),
                    },
                )),
                position_encoding: Some(PositionEncodingKind::UTF16),
                ..ServerCapabilities::default()
            },
            server_info: Some(ServerInfo {
                name: "netlint-server".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        // Server initialized - ready to accept requests
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        self.publish_diagnostics(
            params.text_document.uri,
            &params.text_document.text,
            Source::Base,
        )
        .await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        // Full sync: the last change carries the whole buffer. The in-flight
        // buffer is linted as a snippet so section-scoped rules soften while
        // the user is still typing.
        if let Some(change) = params.content_changes.into_iter().last() {
            self.publish_diagnostics(params.text_document.uri, &change.text, Source::Snippet)
                .await;
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let content = if let Some(text) = params.text {
            text
        } else {
            // Fallback: some LSP clients don't send text despite the server
            // requesting include_text
            match params.text_document.uri.to_file_path() {
                Ok(path) => match std::fs::read_to_string(&path) {
                    Ok(content) => content,
                    Err(err) => {
                        eprintln!("Failed to read {path:?}: {err}");
                        return;
                    }
                },
                Err(_) => {
                    eprintln!("Invalid file path: {}", params.text_document.uri);
                    return;
                }
            }
        };

        self.publish_diagnostics(params.text_document.uri, &content, Source::Base)
            .await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        // Clear diagnostics
        self.client
            .publish_diagnostics(params.text_document.uri, vec![], None)
            .await;
    }

    async fn diagnostic(
        &self,
        _params: DocumentDiagnosticParams,
    ) -> jsonrpc::Result<DocumentDiagnosticReportResult> {
        // Diagnostics are push-model only; the pull request carries no
        // document content to lint.
        Ok(DocumentDiagnosticReportResult::Report(
            DocumentDiagnosticReport::Full(RelatedFullDocumentDiagnosticReport {
                related_documents: None,
                full_document_diagnostic_report: FullDocumentDiagnosticReport {
                    result_id: None,
                    items: vec![],
                },
            }),
        ))
    }

    async fn shutdown(&self) -> jsonrpc::Result<()> {
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    eprintln!("netlint LSP server starting...");

    let (service, socket) = LspService::new(Backend::new);

    Server::new(stdin(), stdout(), socket).serve(service).await;

    Ok(())
}
