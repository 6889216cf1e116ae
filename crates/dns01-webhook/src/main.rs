// # dns01-webhook - cert-manager DNS-01 webhook for Gandi LiveDNS
//
// This binary is a THIN integration layer:
// - All challenge logic lives in dns01-core
// - All Gandi API logic lives in dns01-provider-gandi
// - Configuration is via environment variables ONLY
//
// The daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Registering the Gandi solver and connecting it to Kubernetes
// 4. Serving challenge payloads until EOF or a shutdown signal
//
// ## Transport
//
// One `ChallengePayload` JSON document per stdin line. Each is answered by
// one response payload line on stdout carrying the request's uid. Payloads
// are solved concurrently, so responses are written in completion order.
// On EOF the in-flight payloads are answered before exiting; a shutdown
// signal abandons them.
//
// ## Configuration
//
// - `GROUP_NAME`: API group the solver is registered under (required)
// - `SOLVER_NAME`: Solver that handles payloads (default: gandi)
// - `LOG_LEVEL`: trace, debug, info, warn, error (default: info)
// - `GANDI_API_URL`: LiveDNS base URL override
//
// ## Example
//
// ```bash
// export GROUP_NAME=acme.example.com
// echo '{"apiVersion":"acme.cert-manager.io/v1alpha1","kind":"ChallengePayload","request":{...}}' \
//     | dns01-webhook
// ```

use anyhow::Result;
use dns01_core::registry::REASON_BAD_REQUEST;
use dns01_core::{ChallengePayload, ChallengeResponse, SolverRegistry, WebhookConfig};
use dns01_provider_gandi::GandiClientFactory;
use dns01_secret_kube::KubeConnector;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum WebhookExitCode {
    /// Clean shutdown (EOF or signal)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<WebhookExitCode> for ExitCode {
    fn from(code: WebhookExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    // Load and validate configuration from environment
    let config = match WebhookConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}", e);
            return WebhookExitCode::ConfigError.into();
        }
    };

    // Initialize tracing on stderr; stdout carries responses
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return WebhookExitCode::ConfigError.into();
    }

    info!("Starting dns01-webhook for group {}", config.group_name);

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return WebhookExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        let (stop_tx, stop_rx) = watch::channel(false);

        let registry = match start(&config, stop_rx).await {
            Ok(registry) => registry,
            Err(e) => {
                error!("Startup error: {}", e);
                return WebhookExitCode::ConfigError;
            }
        };

        let input = BufReader::new(tokio::io::stdin());
        let mut output = tokio::io::stdout();
        let shutdown = wait_for_shutdown();

        let code = match serve(Arc::new(registry), &config.solver_name, input, &mut output, shutdown)
            .await
        {
            Ok(()) => WebhookExitCode::CleanShutdown,
            Err(e) => {
                error!("Webhook error: {}", e);
                WebhookExitCode::RuntimeError
            }
        };

        // Receivers may all be gone already
        let _ = stop_tx.send(true);
        code
    });

    result.into()
}

/// Register and initialize the solvers
async fn start(config: &WebhookConfig, stop: watch::Receiver<bool>) -> Result<SolverRegistry> {
    let registry = SolverRegistry::new();

    let factory = match &config.gandi_api_url {
        Some(url) => {
            info!("Using Gandi API at {}", url);
            GandiClientFactory::with_base_url(url.clone())
        }
        None => GandiClientFactory::new(),
    };

    info!("Registering Gandi solver");
    dns01_provider_gandi::register(&registry, factory);

    if !registry.has_solver(&config.solver_name) {
        anyhow::bail!(
            "SOLVER_NAME '{}' is not supported. Supported solvers: {}",
            config.solver_name,
            registry.list_solvers().join(", ")
        );
    }

    registry.initialize_all(&KubeConnector::infer(), stop).await?;

    info!("Solver {} initialized", config.solver_name);
    Ok(registry)
}

/// Answer payload lines from `input` until EOF or `shutdown` resolves
async fn serve<R, W, S>(
    registry: Arc<SolverRegistry>,
    solver_name: &str,
    input: R,
    output: &mut W,
    shutdown: S,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    S: Future<Output = Result<&'static str>>,
{
    let mut lines = input.lines();
    let mut in_flight = JoinSet::new();
    let mut input_open = true;
    let mut shutdown = std::pin::pin!(shutdown);

    info!("Ready to serve challenge payloads");

    while input_open || !in_flight.is_empty() {
        tokio::select! {
            signal = &mut shutdown => {
                info!("Received shutdown signal: {}", signal?);
                if !in_flight.is_empty() {
                    warn!("Abandoning {} in-flight challenge(s)", in_flight.len());
                }
                return Ok(());
            }
            Some(done) = in_flight.join_next() => {
                let reply = done?;
                let mut out = serde_json::to_vec(&reply)?;
                out.push(b'\n');
                output.write_all(&out).await?;
                output.flush().await?;
            }
            line = lines.next_line(), if input_open => {
                match line? {
                    Some(line) if line.trim().is_empty() => {}
                    Some(line) => {
                        let registry = registry.clone();
                        let solver_name = solver_name.to_string();
                        in_flight.spawn(async move {
                            handle_line(&registry, &solver_name, &line).await
                        });
                    }
                    None => {
                        info!("Input closed, answering {} in-flight challenge(s)", in_flight.len());
                        input_open = false;
                    }
                }
            }
        }
    }

    Ok(())
}

/// Decode one payload line and dispatch it
async fn handle_line(registry: &SolverRegistry, solver_name: &str, line: &str) -> ChallengePayload {
    match serde_json::from_str::<ChallengePayload>(line) {
        Ok(payload) => {
            debug!("Received payload of kind {}", payload.kind);
            registry.dispatch(solver_name, payload).await
        }
        Err(e) => {
            warn!("Discarding malformed payload: {}", e);
            ChallengePayload::from_response(ChallengeResponse::failure(
                "",
                REASON_BAD_REQUEST,
                format!("malformed challenge payload: {}", e),
            ))
        }
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };

    Ok(signal)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dns01_core::traits::{SecretStoreConnector, Solver, StopSignal};
    use dns01_core::ChallengeRequest;
    use std::time::Duration;

    /// Solver that takes longer for requests whose uid starts with "slow"
    struct PacedSolver;

    #[async_trait]
    impl Solver for PacedSolver {
        fn name(&self) -> &str {
            "gandi"
        }

        async fn initialize(
            &self,
            _connector: &dyn SecretStoreConnector,
            _stop: StopSignal,
        ) -> dns01_core::Result<()> {
            Ok(())
        }

        async fn present(&self, challenge: &ChallengeRequest) -> dns01_core::Result<()> {
            if challenge.uid.starts_with("slow") {
                tokio::time::sleep(Duration::from_millis(300)).await;
            }
            Ok(())
        }

        async fn cleanup(&self, _challenge: &ChallengeRequest) -> dns01_core::Result<()> {
            Ok(())
        }
    }

    fn payload_line(uid: &str) -> String {
        let request = ChallengeRequest::new(
            "cert-manager",
            "example.com.",
            "_acme-challenge.example.com.",
            "abc123",
        )
        .with_uid(uid);
        serde_json::to_string(&ChallengePayload::from_request(request)).unwrap()
    }

    async fn serve_lines(lines: &[String]) -> Vec<ChallengePayload> {
        let registry = SolverRegistry::new();
        registry.register_solver(Arc::new(PacedSolver));

        let input = lines.join("\n");
        let mut output = Vec::new();
        serve(
            Arc::new(registry),
            "gandi",
            input.as_bytes(),
            &mut output,
            std::future::pending(),
        )
        .await
        .unwrap();

        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn slow_challenge_does_not_block_later_ones() {
        let replies = serve_lines(&[payload_line("slow-1"), payload_line("fast-2")]).await;

        let uids: Vec<String> = replies
            .into_iter()
            .map(|reply| reply.response.expect("response set").uid)
            .collect();
        assert_eq!(uids, vec!["fast-2".to_string(), "slow-1".to_string()]);
    }

    #[tokio::test]
    async fn every_line_is_answered_before_eof_exit() {
        let lines = vec![
            payload_line("slow-a"),
            String::new(),
            payload_line("b"),
            "{not json".to_string(),
        ];
        let replies = serve_lines(&lines).await;

        assert_eq!(replies.len(), 3);
        let succeeded = replies
            .iter()
            .filter(|reply| reply.response.as_ref().is_some_and(|r| r.success))
            .count();
        assert_eq!(succeeded, 2);
    }

    #[tokio::test]
    async fn malformed_line_gets_bad_request_response() {
        let registry = SolverRegistry::new();
        let reply = handle_line(&registry, "gandi", "{not json").await;

        let response = reply.response.expect("response set");
        assert!(!response.success);
        let status = response.status.expect("status set");
        assert_eq!(status.reason, REASON_BAD_REQUEST);
        assert!(status.message.starts_with("malformed challenge payload"));
    }

    #[tokio::test]
    async fn unknown_solver_is_rejected_at_startup() {
        let config = WebhookConfig::from_lookup(|key| match key {
            "GROUP_NAME" => Some("acme.example.com".to_string()),
            "SOLVER_NAME" => Some("route53".to_string()),
            _ => None,
        })
        .unwrap();
        let (_tx, rx) = watch::channel(false);

        let err = start(&config, rx).await.err().expect("startup fails");
        assert!(err.to_string().contains("route53"));
    }
}
