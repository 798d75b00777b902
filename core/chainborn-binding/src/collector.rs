//! Runtime identity collection.
//!
//! Observes the environment the validator runs in and emits a binding-data
//! map. Invoked by the orchestrator only when the active policy requires
//! binding and the caller supplied none.

use chainborn_types::BindingData;
use std::env;
use tracing::debug;

/// Case-insensitive prefix for custom binding variables. The prefix is
/// stripped and the remainder lowercased to form the binding key.
pub const BINDING_VAR_PREFIX: &str = "CHAINBORN_BINDING_";

const CGROUP_PATH: &str = "/proc/self/cgroup";

/// Collects binding data from the runtime. Never fails; sources that cannot
/// be read are skipped. Empty and whitespace-only values are omitted.
#[must_use]
pub fn collect() -> BindingData {
    let mut data = BindingData::new();

    if let Some(name) = machine_hostname() {
        insert_nonempty(&mut data, "hostname", name);
    }

    if let Some(id) = container_id() {
        insert_nonempty(&mut data, "container_id", id);
    }

    if let Some(ns) = first_nonempty_var(&["K8S_NAMESPACE", "KUBERNETES_NAMESPACE"]) {
        insert_nonempty(&mut data, "k8s_namespace", ns);
    }
    if let Some(pod) = first_nonempty_var(&["K8S_POD_NAME", "KUBERNETES_POD_NAME"]) {
        insert_nonempty(&mut data, "k8s_pod_name", pod);
    }

    for (name, value) in env::vars() {
        if let Some(key) = custom_binding_key(&name) {
            insert_nonempty(&mut data, &key, value);
        }
    }

    debug!(keys = data.len(), "collected binding data");
    data
}

fn insert_nonempty(data: &mut BindingData, key: &str, value: String) {
    if !value.trim().is_empty() {
        data.insert(key.to_string(), value);
    }
}

fn machine_hostname() -> Option<String> {
    match hostname::get() {
        Ok(name) => name.into_string().ok(),
        Err(e) => {
            debug!("hostname unavailable: {e}");
            None
        }
    }
}

fn first_nonempty_var(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}

/// Container id: the `HOSTNAME` variable when Docker set it to the short or
/// full container id, otherwise parsed from `/proc/self/cgroup`.
fn container_id() -> Option<String> {
    if let Ok(host) = env::var("HOSTNAME") {
        if is_container_id(&host) {
            return Some(host);
        }
    }
    match std::fs::read_to_string(CGROUP_PATH) {
        Ok(contents) => container_id_from_cgroup(&contents),
        Err(e) => {
            debug!("cgroup file unavailable: {e}");
            None
        }
    }
}

/// True for 12–64 character lowercase hex strings, the shapes container
/// runtimes use for container ids.
#[must_use]
pub fn is_container_id(s: &str) -> bool {
    (12..=64).contains(&s.len())
        && s.chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

/// Extracts a container id from cgroup file contents. Recognized path
/// shapes, first matching line wins:
/// - `…/docker/<id>`
/// - `…/docker-<id>.scope`
/// - `…/kubepods/…/pod<…>/<id>`
#[must_use]
pub fn container_id_from_cgroup(contents: &str) -> Option<String> {
    contents.lines().find_map(container_id_from_cgroup_line)
}

fn container_id_from_cgroup_line(line: &str) -> Option<String> {
    // Lines look like `12:memory:/docker/<id>`; the path is the third field.
    let path = line.splitn(3, ':').nth(2)?;
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    for (i, segment) in segments.iter().enumerate() {
        if let Some(id) = segment
            .strip_prefix("docker-")
            .and_then(|s| s.strip_suffix(".scope"))
        {
            if is_container_id(id) {
                return Some(id.to_string());
            }
        }
        if *segment == "docker" {
            if let Some(id) = segments.get(i + 1).filter(|s| is_container_id(s)) {
                return Some((*id).to_string());
            }
        }
    }

    if segments.iter().any(|s| s.contains("kubepods")) {
        let pod_idx = segments.iter().position(|s| s.starts_with("pod"))?;
        let id = segments.get(pod_idx + 1).filter(|s| is_container_id(s))?;
        return Some((*id).to_string());
    }

    None
}

/// Maps a variable name to its custom binding key: strips the
/// [`BINDING_VAR_PREFIX`] (case-insensitively) and lowercases the rest.
/// Returns `None` for non-binding variables and for a bare prefix.
#[must_use]
pub fn custom_binding_key(name: &str) -> Option<String> {
    let prefix_len = BINDING_VAR_PREFIX.len();
    if name.len() <= prefix_len {
        return None;
    }
    if !name.as_bytes()[..prefix_len].eq_ignore_ascii_case(BINDING_VAR_PREFIX.as_bytes()) {
        return None;
    }
    name.get(prefix_len..).map(|key| key.to_ascii_lowercase())
}
