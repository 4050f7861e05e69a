use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// How much the terminal layer lets through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Verbosity {
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }

    fn filter(self) -> EnvFilter {
        match self {
            Verbosity::Quiet => EnvFilter::new("off"),
            Verbosity::Verbose => EnvFilter::new("debug"),
            Verbosity::Normal => EnvFilter::from_default_env()
                .add_directive("machine_ignition=info".parse().expect("valid log directive")),
        }
    }
}

/// Install the global subscriber: one stderr layer, stdout stays free for
/// command output.
pub fn init(verbosity: Verbosity) {
    let terminal_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(verbosity.filter());

    tracing_subscriber::registry().with(terminal_layer).init();
}
