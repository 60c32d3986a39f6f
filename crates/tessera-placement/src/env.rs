//! Environment synthesis for command descriptions.
//!
//! Later layers override earlier ones on key collision:
//!
//! 1. task context (`MESOS_TASK_ID`, `MARATHON_APP_*`, label variables),
//!    only when a task id is known
//! 2. `PORT*` and `HOST`, with the operator's optional prefix
//! 3. the app's own `env`, so user values always win

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use tessera_core::{CommandInfo, CommandUri, Environment, Variable};
use tessera_state::{AppDefinition, RANDOM_PORT};

/// Labels with a key this long or longer are not exported.
pub const MAX_LABEL_KEY_LENGTH: usize = 500;
/// Labels with a value this long or longer are not exported.
pub const MAX_LABEL_VALUE_LENGTH: usize = 512;
pub const LABEL_PREFIX: &str = "MARATHON_APP_LABEL_";

// pattern is a literal
static NON_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_]+").unwrap());

/// `team.name/v2` → `TEAM_NAME_V2`
pub fn sanitize_label_key(key: &str) -> String {
    NON_NAME_CHARS.replace_all(key, "_").to_uppercase()
}

pub fn labels_env(labels: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let exported: Vec<(String, &String)> = labels
        .iter()
        .filter(|(key, value)| {
            key.chars().count() < MAX_LABEL_KEY_LENGTH
                && value.chars().count() < MAX_LABEL_VALUE_LENGTH
        })
        .map(|(key, value)| (sanitize_label_key(key), value))
        .collect();

    let mut env = BTreeMap::new();
    env.insert(
        "MARATHON_APP_LABELS".to_string(),
        exported
            .iter()
            .map(|(key, _)| key.as_str())
            .collect::<Vec<_>>()
            .join(" "),
    );
    for (key, value) in exported {
        env.insert(format!("{LABEL_PREFIX}{key}"), value.clone());
    }
    env
}

/// Variables describing the task itself. Empty without a task id.
pub fn task_context_env(app: &AppDefinition, task_id: Option<&str>) -> BTreeMap<String, String> {
    let Some(task_id) = task_id else {
        return BTreeMap::new();
    };

    let mut env = BTreeMap::from([
        ("MESOS_TASK_ID".to_string(), task_id.to_string()),
        ("MARATHON_APP_ID".to_string(), app.id.to_string()),
        ("MARATHON_APP_VERSION".to_string(), app.version_string()),
        ("MARATHON_APP_RESOURCE_CPUS".to_string(), format!("{:?}", app.cpus)),
        ("MARATHON_APP_RESOURCE_MEM".to_string(), format!("{:?}", app.mem)),
        ("MARATHON_APP_RESOURCE_DISK".to_string(), format!("{:?}", app.disk)),
    ]);
    if let Some(image) = app.docker_image() {
        env.insert("MARATHON_APP_DOCKER_IMAGE".to_string(), image.to_string());
    }
    env.extend(labels_env(&app.labels));
    env
}

/// `PORT<n>`, `PORT_<declared>`, `PORT` and `PORTS`. Empty without ports.
pub fn ports_env(declared: &[u32], assigned: &[u32]) -> BTreeMap<String, String> {
    let Some(first) = assigned.first() else {
        return BTreeMap::new();
    };

    let mut env = BTreeMap::new();
    for (n, port) in assigned.iter().enumerate() {
        env.insert(format!("PORT{n}"), port.to_string());
    }
    for (declared, port) in declared.iter().zip(assigned) {
        if *declared != RANDOM_PORT {
            env.insert(format!("PORT_{declared}"), port.to_string());
        }
    }
    env.insert("PORT".to_string(), first.to_string());
    env.insert(
        "PORTS".to_string(),
        assigned
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(","),
    );
    env
}

fn with_prefix(prefix: Option<&str>, env: BTreeMap<String, String>) -> BTreeMap<String, String> {
    match prefix {
        Some(prefix) => env
            .into_iter()
            .map(|(key, value)| (format!("{prefix}{key}"), value))
            .collect(),
        None => env,
    }
}

/// The complete, merged environment for a task.
pub fn task_env(
    app: &AppDefinition,
    task_id: Option<&str>,
    host: Option<&str>,
    ports: &[u32],
    prefix: Option<&str>,
) -> BTreeMap<String, String> {
    let mut network = ports_env(&app.declared_ports(), ports);
    if let Some(host) = host {
        network.insert("HOST".to_string(), host.to_string());
    }

    let mut env = task_context_env(app, task_id);
    env.extend(with_prefix(prefix, network));
    env.extend(app.env.iter().map(|(k, v)| (k.clone(), v.clone())));
    env
}

/// Build the command description for `app`.
///
/// `args` take precedence over `cmd`. Without a container the first
/// argument is also the command value, which the native command executor
/// requires.
pub fn command_info(
    app: &AppDefinition,
    task_id: Option<&str>,
    host: Option<&str>,
    ports: &[u32],
    prefix: Option<&str>,
) -> CommandInfo {
    let environment = Environment {
        variables: task_env(app, task_id, host, ports, prefix)
            .into_iter()
            .map(|(name, value)| Variable { name, value })
            .collect(),
    };

    let mut command = CommandInfo {
        environment,
        user: app.user.clone(),
        uris: app
            .fetch
            .iter()
            .map(|f| CommandUri {
                value: f.uri.clone(),
                executable: f.executable,
                extract: f.extract,
                cache: f.cache,
            })
            .collect(),
        ..CommandInfo::default()
    };

    match &app.cmd {
        Some(cmd) if !cmd.is_empty() => command.value = Some(cmd.clone()),
        _ => command.shell = false,
    }

    if let Some(args) = &app.args {
        command.shell = false;
        command.arguments = args.clone();
        command.value = None;
        if app.container.is_none() {
            if let Some(first) = args.first() {
                command.value = Some(first.clone());
            }
        }
    }

    command
}
