#[cfg(test)]
mod tests {
    use crate::client::LspClient;
    use crate::lifecycle::Phase;
    use crate::state::GlobalState;
    use crate::Backend;
    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tower_lsp::jsonrpc::{self, ErrorCode};
    use tower_lsp::lsp_types::*;
    use tower_lsp::LanguageServer;
    use tron_core::line_map::LineMap;
    use tron_core::model::Symbol;
    use tron_core::syntax::ast;
    use tron_core::{AdlFrontend, Frontend, ParseFailure, Workspace};

    type Published = (Url, Vec<Diagnostic>, Option<i32>);

    #[derive(Default)]
    struct Recorded {
        folders: Mutex<Option<Vec<WorkspaceFolder>>>,
        /// `None` makes the configuration request fail
        configuration: Mutex<Option<Vec<Value>>>,
        configuration_requests: Mutex<Vec<Vec<ConfigurationItem>>>,
        published: Mutex<Vec<Published>>,
        shown: Mutex<Vec<String>>,
        logged: Mutex<Vec<String>>,
    }

    /// Client double answering from canned data and recording every call
    #[derive(Clone, Default)]
    struct RecordingClient {
        recorded: Arc<Recorded>,
    }

    impl RecordingClient {
        fn with_configuration(fragments: Vec<Value>) -> Self {
            let client = Self::default();
            *client.recorded.configuration.lock() = Some(fragments);
            client
        }

        fn published_for(&self, uri: &Url) -> Vec<Published> {
            self.recorded
                .published
                .lock()
                .iter()
                .filter(|(published, _, _)| published == uri)
                .cloned()
                .collect()
        }

        fn logged_containing(&self, needle: &str) -> usize {
            self.recorded
                .logged
                .lock()
                .iter()
                .filter(|message| message.contains(needle))
                .count()
        }
    }

    #[tower_lsp::async_trait]
    impl LspClient for RecordingClient {
        async fn workspace_folders(&self) -> jsonrpc::Result<Option<Vec<WorkspaceFolder>>> {
            Ok(self.recorded.folders.lock().clone())
        }

        async fn configuration(&self, items: Vec<ConfigurationItem>) -> jsonrpc::Result<Vec<Value>> {
            self.recorded.configuration_requests.lock().push(items);
            self.recorded
                .configuration
                .lock()
                .clone()
                .ok_or_else(jsonrpc::Error::internal_error)
        }

        async fn publish_diagnostics(
            &self,
            uri: Url,
            diagnostics: Vec<Diagnostic>,
            version: Option<i32>,
        ) {
            self.recorded
                .published
                .lock()
                .push((uri, diagnostics, version));
        }

        async fn show_message(&self, _: MessageType, message: String) {
            self.recorded.shown.lock().push(message);
        }

        async fn log_message(&self, _: MessageType, message: String) {
            self.recorded.logged.lock().push(message);
        }
    }

    #[derive(Default)]
    struct CountingFrontend {
        parses: AtomicUsize,
    }

    impl Frontend for CountingFrontend {
        fn parse(&self, text: &str) -> Result<ast::Module, ParseFailure> {
            self.parses.fetch_add(1, Ordering::SeqCst);
            AdlFrontend.parse(text)
        }

        fn symbols(&self, module: &ast::Module, map: &LineMap) -> Vec<Symbol> {
            AdlFrontend.symbols(module, map)
        }
    }

    /// Blows up on documents mentioning `Cycle`
    struct FragileFrontend;

    impl Frontend for FragileFrontend {
        fn parse(&self, text: &str) -> Result<ast::Module, ParseFailure> {
            AdlFrontend.parse(text)
        }

        fn symbols(&self, module: &ast::Module, map: &LineMap) -> Vec<Symbol> {
            if map.text().contains("Cycle") {
                panic!("visitor recursed into Cycle");
            }
            AdlFrontend.symbols(module, map)
        }
    }

    const GOOD: &str = "module zoo {\n  struct Animal { String name; };\n  union Pet<T> { T dog; };\n};\n";
    const BAD: &str = "module zoo {\n  struct Animal { String ; };\n};\n";

    fn uri(name: &str) -> Url {
        Url::parse(&format!("file:///ws/zoo/{}", name)).unwrap()
    }

    fn root() -> Url {
        Url::parse("file:///ws/zoo").unwrap()
    }

    #[allow(deprecated)]
    fn initialize_params(root_uri: Option<Url>, workspace_features: bool) -> InitializeParams {
        InitializeParams {
            root_uri,
            capabilities: ClientCapabilities {
                workspace: Some(WorkspaceClientCapabilities {
                    configuration: Some(workspace_features),
                    workspace_folders: Some(workspace_features),
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn backend(client: &RecordingClient) -> Backend<RecordingClient> {
        Backend::with_client(client.clone(), GlobalState::new())
    }

    async fn start(backend: &Backend<RecordingClient>) {
        backend
            .initialize(initialize_params(Some(root()), true))
            .await
            .unwrap();
        backend.initialized(InitializedParams {}).await;
    }

    async fn open(backend: &Backend<RecordingClient>, uri: &Url, version: i32, text: &str) {
        backend
            .did_open(DidOpenTextDocumentParams {
                text_document: TextDocumentItem::new(
                    uri.clone(),
                    "adl".to_string(),
                    version,
                    text.to_string(),
                ),
            })
            .await;
    }

    async fn change(backend: &Backend<RecordingClient>, uri: &Url, version: i32, text: &str) {
        backend
            .did_change(DidChangeTextDocumentParams {
                text_document: VersionedTextDocumentIdentifier::new(uri.clone(), version),
                content_changes: vec![TextDocumentContentChangeEvent {
                    range: None,
                    range_length: None,
                    text: text.to_string(),
                }],
            })
            .await;
    }

    async fn close(backend: &Backend<RecordingClient>, uri: &Url) {
        backend
            .did_close(DidCloseTextDocumentParams {
                text_document: TextDocumentIdentifier::new(uri.clone()),
            })
            .await;
    }

    fn symbol_params(uri: &Url) -> DocumentSymbolParams {
        DocumentSymbolParams {
            text_document: TextDocumentIdentifier::new(uri.clone()),
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
        }
    }

    fn nested(response: Option<DocumentSymbolResponse>) -> Vec<DocumentSymbol> {
        match response {
            Some(DocumentSymbolResponse::Nested(symbols)) => symbols,
            other => panic!("expected nested symbols, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_requests_before_initialized_are_rejected() {
        let client = RecordingClient::default();
        let backend = backend(&client);

        let err = backend.document_symbol(symbol_params(&uri("a.adl"))).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ServerError(-32002));

        backend
            .initialize(initialize_params(None, false))
            .await
            .unwrap();
        let err = backend.hover(HoverParams {
            text_document_position_params: TextDocumentPositionParams::new(
                TextDocumentIdentifier::new(uri("a.adl")),
                Position::new(0, 0),
            ),
            work_done_progress_params: Default::default(),
        })
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ServerError(-32002));

        // Document sync before `initialized` is dropped, not queued
        open(&backend, &uri("a.adl"), 1, GOOD).await;
        assert!(backend.state().workspace.open_documents().is_empty());
    }

    #[tokio::test]
    async fn test_initialize_advertises_static_capabilities() {
        let client = RecordingClient::default();
        let backend = backend(&client);
        let result = backend
            .initialize(initialize_params(None, false))
            .await
            .unwrap();

        let capabilities = result.capabilities;
        assert_eq!(
            capabilities.text_document_sync,
            Some(TextDocumentSyncCapability::Options(TextDocumentSyncOptions {
                open_close: Some(true),
                change: Some(TextDocumentSyncKind::FULL),
                will_save: Some(true),
                will_save_wait_until: Some(true),
                save: Some(TextDocumentSyncSaveOptions::Supported(true)),
            }))
        );
        assert_eq!(
            capabilities.completion_provider.unwrap().trigger_characters,
            Some(vec![".".to_string()])
        );
        assert_eq!(
            capabilities.signature_help_provider.unwrap().trigger_characters,
            Some(vec!["(".to_string(), ",".to_string()])
        );
        assert_eq!(
            capabilities.execute_command_provider.unwrap().commands,
            vec!["tron.compile".to_string(), "tron.browse".to_string()]
        );
        assert_eq!(result.server_info.unwrap().name, "tron-lsp");
        assert_eq!(backend.state().lifecycle.phase(), Phase::Initializing);
        assert!(backend.state().scratch.lock().is_some());

        // A second initialize is a protocol error
        assert!(backend
            .initialize(initialize_params(None, false))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_handshake_without_folders_or_root_degrades() {
        let client = RecordingClient::with_configuration(vec![json!({ "exclude": [] })]);
        *client.recorded.folders.lock() = Some(Vec::new());
        let backend = backend(&client);

        backend
            .initialize(initialize_params(None, true))
            .await
            .unwrap();
        backend.initialized(InitializedParams {}).await;

        assert_eq!(backend.state().lifecycle.phase(), Phase::Initialized);
        assert!(client.recorded.configuration_requests.lock().is_empty());
        assert!(backend.state().session.read().await.folders.is_empty());
        assert_eq!(
            backend.state().session.read().await.settings,
            crate::config::Settings::default()
        );
        assert_eq!(*client.recorded.shown.lock(), vec!["tron-lsp ready".to_string()]);
        assert_eq!(client.logged_containing("single-file"), 1);
    }

    #[tokio::test]
    async fn test_handshake_synthesizes_folder_from_root() {
        let client = RecordingClient::with_configuration(vec![
            json!({ "diagnostics": { "maxProblems": 1 }, "completion": { "keywords": false } }),
            json!({ "diagnostics.maxProblems": 2 }),
        ]);
        *client.recorded.folders.lock() = Some(Vec::new());
        let backend = backend(&client);
        start(&backend).await;

        let session = backend.state().session.read().await;
        assert_eq!(session.folders.len(), 1);
        assert_eq!(session.folders[0].name, "zoo");

        let requests = client.recorded.configuration_requests.lock();
        assert_eq!(requests.len(), 1);
        let sections: Vec<Option<&str>> = requests[0]
            .iter()
            .map(|item| item.section.as_deref())
            .collect();
        assert_eq!(sections, vec![Some("tron"), Some("[tron]")]);
        assert!(requests[0]
            .iter()
            .all(|item| item.scope_uri.as_ref() == Some(&root())));

        // Language-scoped fragment came last and wins
        assert_eq!(session.settings.diagnostics.max_problems, 2);
        assert!(!session.settings.completion.keywords);
        assert_eq!(backend.state().workspace.config().max_problems, 2);
    }

    #[tokio::test]
    async fn test_configuration_failure_keeps_defaults() {
        // No canned configuration: the request fails
        let client = RecordingClient::default();
        let backend = backend(&client);
        start(&backend).await;

        assert_eq!(backend.state().lifecycle.phase(), Phase::Initialized);
        assert_eq!(client.recorded.configuration_requests.lock().len(), 1);
        assert_eq!(
            backend.state().session.read().await.settings,
            crate::config::Settings::default()
        );
        assert_eq!(client.recorded.shown.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_client_without_configuration_support_is_not_asked() {
        let client = RecordingClient::with_configuration(vec![]);
        let backend = backend(&client);
        backend
            .initialize(initialize_params(Some(root()), false))
            .await
            .unwrap();
        backend.initialized(InitializedParams {}).await;

        assert!(client.recorded.configuration_requests.lock().is_empty());
        assert_eq!(backend.state().session.read().await.folders[0].name, "zoo");
        assert!(backend.state().lifecycle.is_initialized());
    }

    #[tokio::test]
    async fn test_open_and_fix_publishes_then_clears() {
        let client = RecordingClient::with_configuration(vec![]);
        let backend = backend(&client);
        start(&backend).await;

        let doc = uri("a.adl");
        open(&backend, &doc, 1, BAD).await;
        backend.publisher().flush().await;
        change(&backend, &doc, 2, GOOD).await;
        backend.publisher().flush().await;

        let published = client.published_for(&doc);
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].1.len(), 1);
        assert_eq!(published[0].1[0].range.start.line, 1);
        assert_eq!(published[0].1[0].source.as_deref(), Some("tron"));
        assert_eq!(published[0].2, Some(1));
        assert!(published[1].1.is_empty());
        assert_eq!(published[1].2, Some(2));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_diagnostics_follow_edit_order() {
        let client = RecordingClient::with_configuration(vec![]);
        let backend = backend(&client);
        start(&backend).await;

        let doc = uri("a.adl");
        open(&backend, &doc, 1, BAD).await;
        for version in 2..=40 {
            let text = if version % 2 == 0 { GOOD } else { BAD };
            change(&backend, &doc, version, text).await;
        }
        backend.publisher().flush().await;

        let published = client.published_for(&doc);
        assert!(!published.is_empty());
        let versions: Vec<i32> = published.iter().filter_map(|(_, _, v)| *v).collect();
        assert!(versions.windows(2).all(|pair| pair[0] < pair[1]), "{:?}", versions);

        // The final text is clean, and its result is what the client ends up with
        let (_, last, version) = published.last().unwrap();
        assert_eq!(*version, Some(40));
        assert!(last.is_empty());
    }

    #[tokio::test]
    async fn test_stale_result_is_not_published() {
        let client = RecordingClient::with_configuration(vec![]);
        let backend = backend(&client);
        start(&backend).await;

        let doc = uri("a.adl");
        open(&backend, &doc, 1, BAD).await;
        let old = backend.state().workspace.snapshot(&doc).unwrap();
        backend.publisher().flush().await;
        change(&backend, &doc, 2, GOOD).await;
        backend.publisher().flush().await;

        // A late result for revision 1 arrives after revision 2 was published
        backend.publisher().schedule(old);
        backend.publisher().flush().await;

        let published = client.published_for(&doc);
        assert_eq!(published.len(), 2);
        assert!(published.last().unwrap().1.is_empty());
    }

    #[tokio::test]
    async fn test_close_clears_diagnostics() {
        let client = RecordingClient::with_configuration(vec![]);
        let backend = backend(&client);
        start(&backend).await;

        let doc = uri("a.adl");
        open(&backend, &doc, 1, BAD).await;
        let pending = backend.state().workspace.snapshot(&doc).unwrap();
        backend.publisher().flush().await;
        close(&backend, &doc).await;

        let published = client.published_for(&doc);
        assert_eq!(published.len(), 2);
        assert!(published[1].1.is_empty());

        // Nothing from the closed incarnation may come back afterwards
        backend.publisher().schedule(pending);
        backend.publisher().flush().await;
        assert_eq!(client.published_for(&doc).len(), 2);

        let symbols = backend.document_symbol(symbol_params(&doc)).await.unwrap();
        assert!(nested(symbols).is_empty());
    }

    #[tokio::test]
    async fn test_change_after_close_does_not_reopen() {
        let client = RecordingClient::with_configuration(vec![]);
        let backend = backend(&client);
        start(&backend).await;

        let doc = uri("a.adl");
        open(&backend, &doc, 1, BAD).await;
        backend.publisher().flush().await;
        close(&backend, &doc).await;
        // A change handler that completes after the close
        change(&backend, &doc, 2, BAD).await;
        backend.publisher().flush().await;

        assert!(backend.state().workspace.open_documents().is_empty());
        let published = client.published_for(&doc);
        assert_eq!(published.len(), 2);
        let (_, last, version) = published.last().unwrap();
        assert!(last.is_empty());
        assert_eq!(*version, None);
        assert_eq!(backend.publisher().lanes(), 0);
    }

    #[tokio::test]
    async fn test_closed_documents_release_their_lanes() {
        let client = RecordingClient::with_configuration(vec![]);
        let backend = backend(&client);
        start(&backend).await;

        let docs: Vec<Url> = (0..5).map(|i| uri(&format!("d{}.adl", i))).collect();
        for doc in &docs {
            open(&backend, doc, 1, GOOD).await;
        }
        backend.publisher().flush().await;
        assert_eq!(backend.publisher().lanes(), docs.len());

        for doc in &docs {
            close(&backend, doc).await;
        }
        assert_eq!(backend.publisher().lanes(), 0);

        // Reopening starts a fresh lane that publishes normally
        open(&backend, &docs[0], 1, BAD).await;
        backend.publisher().flush().await;
        assert_eq!(backend.publisher().lanes(), 1);
        assert_eq!(client.published_for(&docs[0]).last().unwrap().1.len(), 1);
    }

    #[tokio::test]
    async fn test_excluded_file_never_reaches_analysis() {
        let client = RecordingClient::with_configuration(vec![]);
        let frontend = Arc::new(CountingFrontend::default());
        let state = GlobalState::with_workspace(Workspace::new(frontend.clone()));
        let backend = Backend::with_client(client.clone(), state);
        start(&backend).await;

        let manifest = uri("zoo.manifest.adl");
        open(&backend, &manifest, 1, BAD).await;
        change(&backend, &manifest, 2, GOOD).await;
        let symbols = backend
            .document_symbol(symbol_params(&manifest))
            .await
            .unwrap();
        close(&backend, &manifest).await;
        backend.publisher().flush().await;

        assert!(nested(symbols).is_empty());
        assert!(client.published_for(&manifest).is_empty());
        assert_eq!(frontend.parses.load(Ordering::SeqCst), 0);

        // Ordinary documents still go through
        open(&backend, &uri("a.adl"), 1, BAD).await;
        backend.publisher().flush().await;
        assert_eq!(client.published_for(&uri("a.adl")).len(), 1);
        assert_eq!(frontend.parses.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_fault_on_one_document_is_isolated() {
        let client = RecordingClient::with_configuration(vec![]);
        let state = GlobalState::with_workspace(Workspace::new(Arc::new(FragileFrontend)));
        let backend = Backend::with_client(client.clone(), state);
        start(&backend).await;

        let broken = uri("broken.adl");
        let healthy = uri("healthy.adl");
        open(&backend, &broken, 1, "module m { type Cycle = Cycle; };").await;
        open(&backend, &healthy, 1, GOOD).await;

        let (a, b) = tokio::join!(
            backend.document_symbol(symbol_params(&broken)),
            backend.document_symbol(symbol_params(&healthy)),
        );

        assert!(nested(a.unwrap()).is_empty());
        let b = nested(b.unwrap());
        assert_eq!(b[0].name, "zoo");
        assert_eq!(b[0].children.as_ref().unwrap().len(), 2);

        // The session keeps serving the broken document
        assert!(backend.document_symbol(symbol_params(&broken)).await.is_ok());
    }

    #[tokio::test]
    async fn test_completion_offers_declared_types() {
        let client = RecordingClient::with_configuration(vec![]);
        let backend = backend(&client);
        start(&backend).await;

        let doc = uri("a.adl");
        open(&backend, &doc, 1, GOOD).await;
        let response = backend
            .completion(CompletionParams {
                text_document_position: TextDocumentPositionParams::new(
                    TextDocumentIdentifier::new(doc.clone()),
                    Position::new(1, 2),
                ),
                work_done_progress_params: Default::default(),
                partial_result_params: Default::default(),
                context: None,
            })
            .await
            .unwrap();

        let Some(CompletionResponse::Array(items)) = response else {
            panic!("expected a completion list");
        };
        let labels: Vec<&str> = items.iter().map(|item| item.label.as_str()).collect();
        assert!(labels.contains(&"struct"));
        assert!(labels.contains(&"Int32"));
        assert!(labels.contains(&"Animal"));
        assert!(labels.contains(&"Pet"));
    }

    #[tokio::test]
    async fn test_execute_commands() {
        let client = RecordingClient::with_configuration(vec![]);
        let backend = backend(&client);
        start(&backend).await;

        open(&backend, &uri("a.adl"), 1, BAD).await;
        open(&backend, &uri("b.adl"), 1, GOOD).await;
        open(&backend, &uri("c.manifest.adl"), 1, BAD).await;
        backend.publisher().flush().await;

        let compile = backend
            .execute_command(ExecuteCommandParams {
                command: "tron.compile".to_string(),
                arguments: Vec::new(),
                work_done_progress_params: Default::default(),
            })
            .await
            .unwrap();
        assert_eq!(compile, Some(json!(2)));

        let browse = backend
            .execute_command(ExecuteCommandParams {
                command: "tron.browse".to_string(),
                arguments: vec![json!("zoo.Animal")],
                work_done_progress_params: Default::default(),
            })
            .await
            .unwrap();
        assert_eq!(browse, None);

        let unknown = backend
            .execute_command(ExecuteCommandParams {
                command: "tron.launch".to_string(),
                arguments: Vec::new(),
                work_done_progress_params: Default::default(),
            })
            .await;
        assert!(unknown.is_err());
    }

    #[tokio::test]
    async fn test_configuration_change_is_pulled_and_applied() {
        let client = RecordingClient::with_configuration(vec![]);
        let backend = backend(&client);
        start(&backend).await;

        let doc = uri("a.adl");
        open(&backend, &doc, 1, BAD).await;
        backend.publisher().flush().await;

        *client.recorded.configuration.lock() =
            Some(vec![json!({ "diagnostics": { "enabled": false } }), Value::Null]);
        backend
            .did_change_configuration(DidChangeConfigurationParams {
                settings: Value::Null,
            })
            .await;
        backend.publisher().flush().await;

        assert!(!backend.state().workspace.config().diagnostics_enabled);
        let published = client.published_for(&doc);
        assert_eq!(published.len(), 2);
        assert!(published[1].1.is_empty());
    }

    #[tokio::test]
    async fn test_rejected_exclude_is_not_kept_in_session() {
        let client = RecordingClient::with_configuration(vec![]);
        let backend = backend(&client);
        start(&backend).await;

        *client.recorded.configuration.lock() = Some(vec![
            json!({ "exclude": ["["], "diagnostics": { "maxProblems": 5 } }),
            Value::Null,
        ]);
        backend
            .did_change_configuration(DidChangeConfigurationParams {
                settings: Value::Null,
            })
            .await;

        let defaults = crate::config::Settings::default();
        {
            let session = backend.state().session.read().await;
            assert_eq!(session.settings.exclude, defaults.exclude);
            assert_eq!(session.settings.diagnostics.max_problems, 100);
            assert_eq!(session.settings.analysis(), backend.state().workspace.config());
        }
        assert_eq!(client.logged_containing("tron:"), 1);

        // A later valid update applies on top of what is really in force
        *client.recorded.configuration.lock() =
            Some(vec![json!({ "diagnostics": { "maxProblems": 7 } }), Value::Null]);
        backend
            .did_change_configuration(DidChangeConfigurationParams {
                settings: Value::Null,
            })
            .await;
        let config = backend.state().workspace.config();
        assert_eq!(config.max_problems, 7);
        assert_eq!(config.exclude, defaults.exclude);
    }

    #[tokio::test]
    async fn test_workspace_folder_change_updates_folders_and_pulls() {
        let client = RecordingClient::with_configuration(vec![]);
        let backend = backend(&client);
        start(&backend).await;
        assert_eq!(client.recorded.configuration_requests.lock().len(), 1);

        let farm = Url::parse("file:///ws/farm").unwrap();
        *client.recorded.configuration.lock() =
            Some(vec![json!({ "diagnostics": { "maxProblems": 3 } }), Value::Null]);
        backend
            .did_change_workspace_folders(DidChangeWorkspaceFoldersParams {
                event: WorkspaceFoldersChangeEvent {
                    added: vec![WorkspaceFolder {
                        uri: farm.clone(),
                        name: "farm".to_string(),
                    }],
                    removed: vec![WorkspaceFolder {
                        uri: root(),
                        name: "zoo".to_string(),
                    }],
                },
            })
            .await;

        let folders: Vec<String> = backend
            .state()
            .session
            .read()
            .await
            .folders
            .iter()
            .map(|folder| folder.name.clone())
            .collect();
        assert_eq!(folders, vec!["farm".to_string()]);

        let requests = client.recorded.configuration_requests.lock();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].len(), 2);
        assert!(requests[1]
            .iter()
            .all(|item| item.scope_uri.as_ref() == Some(&farm)));
        drop(requests);
        assert_eq!(backend.state().workspace.config().max_problems, 3);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_but_does_not_exit() {
        let client = RecordingClient::with_configuration(vec![]);
        let backend = backend(&client);
        start(&backend).await;

        let scratch = backend
            .state()
            .scratch
            .lock()
            .as_ref()
            .map(|dir| dir.path().to_path_buf())
            .unwrap();
        assert!(scratch.exists());

        backend.shutdown().await.unwrap();

        assert_eq!(backend.state().lifecycle.phase(), Phase::ShuttingDown);
        assert!(backend.state().is_cancelled());
        assert!(!scratch.exists());

        let err = backend
            .document_symbol(symbol_params(&uri("a.adl")))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRequest);
        assert!(backend.shutdown().await.is_err());

        assert_eq!(backend.state().lifecycle.exit(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_stops_at_shutdown() {
        let client = RecordingClient::with_configuration(vec![
            json!({ "heartbeat": { "enabled": true, "intervalSecs": 1 } }),
            Value::Null,
        ]);
        let backend = backend(&client);
        start(&backend).await;

        tokio::time::sleep(Duration::from_millis(3500)).await;
        let beats = client.logged_containing("heartbeat");
        assert!((3..=4).contains(&beats), "{} beats", beats);

        backend.shutdown().await.unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;
        let at_shutdown = client.logged_containing("heartbeat");
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(client.logged_containing("heartbeat"), at_shutdown);
    }
}
