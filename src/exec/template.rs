// src/exec/template.rs

//! Shortcode substitution for command templates.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::registry::Server;

static SHORTCODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").expect("shortcode regex is valid"));

/// Absolute install directory of a server.
pub fn server_dir(work_path: &Path, server: &Server) -> PathBuf {
    work_path.join(server.dir.trim_start_matches('/'))
}

/// Build a concrete command line from a script template.
///
/// `{command}` becomes `verb_command` (the server's own command for the
/// verb); every other `{name}` is looked up in the server's fields and then
/// its `vars`. Unknown shortcodes are left as they are.
pub fn render(template: &str, verb_command: &str, server: &Server, work_path: &Path) -> String {
    let template = template.replacen("{command}", verb_command, 1);
    let dir = server_dir(work_path, server);

    SHORTCODE
        .replace_all(&template, |caps: &Captures| {
            let name = &caps[1];
            lookup(name, server, &dir, work_path).unwrap_or_else(|| caps[0].to_string())
        })
        .trim()
        .to_string()
}

fn lookup(name: &str, server: &Server, dir: &Path, work_path: &Path) -> Option<String> {
    let value = match name {
        "dir" => dir.display().to_string(),
        "uuid" => server.uuid.clone(),
        "uuid_short" => server.uuid_short.clone(),
        "id" => server.id.to_string(),
        "host" | "ip" => server.ip.clone(),
        "port" => server.port.to_string(),
        "query_port" => server.query_port.to_string(),
        "rcon_port" => server.rcon_port.to_string(),
        "rcon_password" => server.rcon_password.clone(),
        "game" => server.game.clone(),
        "user" => server.user.clone().unwrap_or_default(),
        "node_work_path" => work_path.display().to_string(),
        other => return server.vars.get(other).cloned(),
    };
    Some(value)
}
