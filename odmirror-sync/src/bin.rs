use std::{ffi::OsString, process::ExitCode};

use camino::Utf8PathBuf;
use clap::Parser;
use odmirror::{
    config::{GraphConfig, RemoteConfig},
    loc, Config,
};
use odmirror_sync::{oauth2, storage, Mirror, Summary};

#[cfg(unix)]
mod posix;

#[cfg(unix)]
use posix::init_logger;

#[cfg(not(unix))]
fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

fn main() -> ExitCode {
    init_logger();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            log::error!("Could not start the async runtime: {err}");
            return ExitCode::FAILURE;
        }
    };
    let res = runtime.block_on(run(std::env::args_os().collect()));
    exit_program(res)
}

#[derive(Parser)]
#[command(name = "odmirror")]
#[command(author, version, about, long_about=None)]
struct Cli {
    /// JSON configuration file.
    /// Defaults to the user configuration file if it exists.
    #[arg(short, long)]
    config: Option<Utf8PathBuf>,

    /// Local folder receiving the mirror
    #[arg(long, env = "OUT_PATH")]
    out_path: Option<Utf8PathBuf>,

    /// File receiving the local paths of downloaded files
    #[arg(long, env = "DIFF_LIST")]
    diff_list: Option<Utf8PathBuf>,

    /// Graph drive endpoint, e.g. /drives/{drive-id}
    #[arg(long, env = "DRIVE_API_BASE")]
    drive_api_base: Option<String>,

    /// Remote folder to mirror, relative to the drive root
    #[arg(long, env = "PARENT_FOLDER")]
    parent_folder: Option<String>,

    #[arg(long, env = "TENANT_ID")]
    tenant_id: Option<String>,

    #[arg(long, env = "CLIENT_ID")]
    client_id: Option<String>,

    #[arg(long, env = "CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,
}

impl Cli {
    /// Values given on the command line or in the environment
    /// take precedence over the configuration file.
    fn override_config(self, config: &mut Config) {
        if let Some(out_path) = self.out_path {
            config.local_dir = out_path;
        }
        if self.diff_list.is_some() {
            config.diff_list = self.diff_list;
        }
        let RemoteConfig::Graph(graph) = &mut config.remote;
        let overrides = [
            (&mut graph.api_base, self.drive_api_base),
            (&mut graph.parent_folder, self.parent_folder),
            (&mut graph.tenant_id, self.tenant_id),
            (&mut graph.client_id, self.client_id),
            (&mut graph.client_secret, self.client_secret),
        ];
        for (field, value) in overrides {
            if let Some(value) = value {
                *field = value;
            }
        }
    }
}

async fn load_config(cli: Cli) -> anyhow::Result<Config> {
    let config_file = match &cli.config {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("No such config file: {path}");
            }
            Some(path.clone())
        }
        None => loc::default_config_file().ok().filter(|path| path.exists()),
    };

    let mut config = match config_file {
        Some(path) => {
            log::info!("Found config file: {path}");
            Config::load_from_file(&path).await?
        }
        None => Config {
            local_dir: Utf8PathBuf::new(),
            diff_list: None,
            remote: RemoteConfig::Graph(GraphConfig::default()),
        },
    };
    cli.override_config(&mut config);
    config.check()?;

    if config.local_dir.is_relative() {
        let cwd = Utf8PathBuf::try_from(std::env::current_dir()?)?;
        config.local_dir = cwd.join(&config.local_dir);
    }
    Ok(config)
}

async fn run(args: Vec<OsString>) -> anyhow::Result<Summary> {
    let cli = Cli::parse_from(args);
    let config = load_config(cli).await?;

    let local = storage::fs::FileSystem::new(&config.local_dir)?;

    match &config.remote {
        RemoteConfig::Graph(graph) => {
            log::info!(
                "Initializing Graph storage with client-id {}",
                graph.client_id
            );

            let client = reqwest::Client::builder().build()?;
            let secret = oauth2::Secret::for_tenant(
                &graph.tenant_id,
                &graph.client_id,
                &graph.client_secret,
            )?;
            let auth = oauth2::Client::new(
                secret,
                vec![oauth2::Scope::new(oauth2::GRAPH_SCOPE.to_string())],
                Some(client.clone()),
            );
            let remote = storage::graph::Graph::new(auth, client, graph);
            mirror(local, remote, config.diff_list.clone()).await
        }
    }
}

async fn mirror<L, R>(local: L, remote: R, diff_list: Option<Utf8PathBuf>) -> anyhow::Result<Summary>
where
    L: storage::Storage,
    R: storage::remote::Storage,
{
    let mut mirror = Mirror::new(local, remote);
    if let Some(diff_list) = diff_list {
        mirror = mirror.with_diff_list(diff_list);
    }
    Ok(mirror.run().await?)
}

fn exit_program(res: anyhow::Result<Summary>) -> ExitCode {
    match res {
        Ok(summary) if summary.is_clean() => ExitCode::SUCCESS,
        Ok(summary) => {
            log::error!("{} files could not be downloaded", summary.failed.len());
            ExitCode::FAILURE
        }
        Err(err) => {
            log::error!("{err:#}");
            let conflict = err
                .downcast_ref::<odmirror::Error>()
                .is_some_and(odmirror::Error::is_type_conflict);
            if conflict {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
