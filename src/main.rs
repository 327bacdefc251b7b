use color_eyre::Result;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use battle_client::{run_all, Config, Reporter};

fn main() -> Result<()> {
    color_eyre::install()?;

    // ログはファイルへのみ出力し、標準出力/標準エラーは結果表示に使う
    let file_appender = rolling::daily("logs", "battle_client.log");
    // guard を drop するとログが失われるため main の終わりまで保持
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    let mut reporter = Reporter::stdio();

    // .env も読む。不正な項目は既定値のまま続行
    let (config, errors) = Config::from_env();
    for e in &errors {
        reporter.failure("config", e, None);
    }
    tracing::info!(base_url = %config.base_url, scenarios = config.scenarios.len(), "start");

    let summary = run_all(&config, &mut reporter);
    tracing::info!(total = summary.total(), failed = summary.failed, "done");

    // 個々の呼び出しの失敗は終了コードに反映しない
    Ok(())
}
