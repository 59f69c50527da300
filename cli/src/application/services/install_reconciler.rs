//! Application service: install and reconcile the main application.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//!
//! The installation is decided from observable state only: the application
//! directory, the isolated environment and its interpreter, and the
//! `runtime-env` completion marker. An environment that has an interpreter
//! but no marker predates the marker and is adopted as is. Fetches land in
//! `<dest>.partial` and are renamed into place on success, so a directory
//! that exists is always complete.

use std::path::Path;

use anyhow::{Context, Result};

use crate::application::ports::{CommandRunner, LocalFs, MarkerStore, ProgressReporter};
use crate::application::services::check_output;
use crate::domain::config::BootConfig;
use crate::domain::install::{InstallObservation, InstallState, MARKER_RUNTIME_ENV};
use crate::domain::plugin::{
    InstallMechanism, PluginDescriptor, is_plugin_dir_name, partial_path, pin_commands, plugin_set,
};

/// Mechanisms applied to one plugin directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginReport {
    pub name: String,
    pub applied: Vec<InstallMechanism>,
}

/// Outcome of `reconcile_installation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub state: InstallState,
    /// Directory names fetched on this start (application first).
    pub fetched: Vec<String>,
    pub env_created: bool,
    /// An existing environment without a marker was recorded as complete.
    pub env_adopted: bool,
    /// Plugins in processing order.
    pub plugins: Vec<PluginReport>,
    /// Number of pinning invocations executed.
    pub pinned: usize,
}

/// Observe the volume and decide between first run and steady state.
///
/// # Errors
///
/// Returns an error if the marker store cannot be read.
pub async fn observe_installation(
    fs: &impl LocalFs,
    markers: &impl MarkerStore,
    config: &BootConfig,
) -> Result<InstallObservation> {
    Ok(InstallObservation {
        app_present: fs.is_dir(&config.app_dir()),
        env_dir_present: fs.is_dir(&config.venv_dir()),
        env_interpreter_present: fs.exists(&config.venv_python()),
        env_marker_present: markers.is_complete(MARKER_RUNTIME_ENV).await?,
    })
}

/// Bring the installation to a runnable state.
///
/// `extra_plugins` is appended to the configured extra plugin list.
///
/// # Errors
///
/// Fails fast on the first fetch, environment, plugin, or pinning command
/// that fails; nothing is retried.
pub async fn reconcile_installation(
    runner: &impl CommandRunner,
    fs: &impl LocalFs,
    markers: &impl MarkerStore,
    reporter: &impl ProgressReporter,
    config: &BootConfig,
    extra_plugins: &[String],
) -> Result<ReconcileReport> {
    let observation = observe_installation(fs, markers, config).await?;
    let state = observation.state();
    tracing::info!(?state, ?observation, "installation state decided");

    let mut report = ReconcileReport {
        state,
        fetched: Vec::new(),
        env_created: false,
        env_adopted: false,
        plugins: Vec::new(),
        pinned: 0,
    };

    if observation.env_adoptable() {
        tracing::info!(path = %config.venv_dir().display(), "adopting existing isolated environment");
        markers.mark_complete(MARKER_RUNTIME_ENV).await?;
        report.env_adopted = true;
    }

    if state == InstallState::FirstRun {
        fs.create_dir_all(&config.paths.install_root)?;

        let app_dir = config.app_dir();
        if !observation.app_present {
            reporter.step(&format!("fetching {}...", config.app.name));
            fetch(runner, fs, &config.app.repo, &app_dir).await?;
            report.fetched.push(config.app.name.clone());
        }

        let mut extra = config.plugins.extra.clone();
        extra.extend(extra_plugins.iter().cloned());
        let plugins = plugin_set(&config.plugins.baseline, &extra, &config.plugins.source_base)?;
        let plugin_root = config.plugin_root();
        fs.create_dir_all(&plugin_root)?;
        for plugin in plugins {
            let dest = plugin_root.join(&plugin.dir_name);
            if fs.is_dir(&dest) {
                continue;
            }
            reporter.step(&format!("fetching plugin {}...", plugin.dir_name));
            fetch(runner, fs, &plugin.url, &dest).await?;
            report.fetched.push(plugin.dir_name);
        }

        if !observation.env_ready() {
            create_runtime_env(runner, fs, markers, reporter, config, observation.env_dir_present)
                .await?;
            report.env_created = true;
        }
    } else {
        reporter.step("existing installation found, reconciling plugins...");
    }

    report.plugins = reconcile_plugins(runner, fs, reporter, config).await?;
    report.pinned = apply_pins(runner, reporter, config).await?;
    reporter.success("installation reconciled");
    Ok(report)
}

/// Clone `url` into `<dest>.partial`, then rename it to `dest`.
async fn fetch(runner: &impl CommandRunner, fs: &impl LocalFs, url: &str, dest: &Path) -> Result<()> {
    let partial = partial_path(dest);
    if fs.exists(&partial) {
        tracing::debug!(path = %partial.display(), "removing stale partial fetch");
        fs.remove_dir_all(&partial)?;
    }
    let partial_str = partial.display().to_string();
    let output = runner
        .run("git", &["clone", url, &partial_str])
        .await
        .with_context(|| format!("cloning {url}"))?;
    check_output(&output, "git")?;
    fs.rename(&partial, dest)
        .with_context(|| format!("moving {} into place", dest.display()))?;
    tracing::info!(%url, dest = %dest.display(), "fetched");
    Ok(())
}

async fn create_runtime_env(
    runner: &impl CommandRunner,
    fs: &impl LocalFs,
    markers: &impl MarkerStore,
    reporter: &impl ProgressReporter,
    config: &BootConfig,
    half_built: bool,
) -> Result<()> {
    let venv = config.venv_dir();
    if half_built {
        tracing::warn!(path = %venv.display(), "isolated environment has no interpreter; recreating");
        fs.remove_dir_all(&venv)?;
    }

    reporter.step("creating isolated runtime environment...");
    let venv_str = venv.display().to_string();
    let python = &config.app.python;
    let output = runner
        .run(python, &["-m", "venv", "--system-site-packages", &venv_str])
        .await
        .context("creating isolated runtime environment")?;
    check_output(&output, python)?;

    let venv_python = config.venv_python().display().to_string();
    let output = runner
        .run(&venv_python, &["-m", "ensurepip", "--upgrade"])
        .await
        .context("bootstrapping package installer")?;
    check_output(&output, &venv_python)?;

    markers.mark_complete(MARKER_RUNTIME_ENV).await?;
    Ok(())
}

/// Apply every plugin's install mechanisms, one plugin at a time, in name order.
async fn reconcile_plugins(
    runner: &impl CommandRunner,
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
    config: &BootConfig,
) -> Result<Vec<PluginReport>> {
    let root = config.plugin_root();
    if !fs.is_dir(&root) {
        return Ok(Vec::new());
    }
    let queue: Vec<PluginDescriptor> = fs
        .list_dirs(&root)?
        .into_iter()
        .filter(|name| is_plugin_dir_name(name))
        .map(|name| PluginDescriptor::detect(&root.join(name), |p| fs.exists(p)))
        .collect();

    let python = config.venv_python().display().to_string();
    let mut reports = Vec::with_capacity(queue.len());
    for plugin in queue {
        if !plugin.mechanisms.is_empty() {
            reporter.step(&format!("installing dependencies for {}...", plugin.name));
        }
        for mechanism in &plugin.mechanisms {
            let output = runner
                .run_in(&plugin.dir, &python, &mechanism.python_args())
                .await
                .with_context(|| format!("{} of plugin {}", mechanism, plugin.name))?;
            check_output(&output, &python)
                .with_context(|| format!("{} of plugin {}", mechanism, plugin.name))?;
        }
        tracing::debug!(plugin = %plugin.name, mechanisms = ?plugin.mechanisms, "plugin reconciled");
        reports.push(PluginReport {
            name: plugin.name,
            applied: plugin.mechanisms,
        });
    }
    Ok(reports)
}

/// Final corrective pinning; runs after every plugin has been processed.
async fn apply_pins(
    runner: &impl CommandRunner,
    reporter: &impl ProgressReporter,
    config: &BootConfig,
) -> Result<usize> {
    let commands = pin_commands(&config.pins.force_no_deps, &config.pins.normal);
    if commands.is_empty() {
        return Ok(0);
    }
    reporter.step("applying corrective version pins...");
    let python = config.venv_python().display().to_string();
    for args in &commands {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = runner
            .run(&python, &args)
            .await
            .context("applying version pins")?;
        check_output(&output, &python)?;
    }
    Ok(commands.len())
}
