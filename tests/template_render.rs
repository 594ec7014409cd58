// tests/template_render.rs

use std::path::Path;

use gamed::exec::template::{render, server_dir};
use gamed::exec::ServerCommand;
use gamed::types::TaskCommand;
use gamed_test_utils::ServerBuilder;

#[test]
fn command_placeholder_is_replaced_first() {
    let server = ServerBuilder::new(7, "servers/cs").start("./hlds_run -port {port}").build();

    let line = render("{command} +map de_dust2", &server.start_command, &server, Path::new("/srv/gameap"));

    assert_eq!(line, "./hlds_run -port 27015 +map de_dust2");
}

#[test]
fn known_shortcodes_are_substituted() {
    let server = ServerBuilder::new(7, "/servers/cs").var("maxplayers", "32").build();

    let line = render(
        "cd {dir} && run --id {id} --ip {ip} --host {host} --qp {query_port} --rp {rcon_port} \
         --uuid {uuid_short} --game {game} --max {maxplayers} --root {node_work_path}",
        "",
        &server,
        Path::new("/srv/gameap"),
    );

    assert_eq!(
        line,
        "cd /srv/gameap/servers/cs && run --id 7 --ip 127.0.0.1 --host 127.0.0.1 --qp 27016 \
         --rp 27017 --uuid 00000007 --game testgame --max 32 --root /srv/gameap"
    );
}

#[test]
fn unknown_shortcodes_are_left_alone() {
    let server = ServerBuilder::new(1, "s").build();

    let line = render("echo {nope} {also_nope}", "", &server, Path::new("/w"));

    assert_eq!(line, "echo {nope} {also_nope}");
}

#[test]
fn empty_template_renders_empty() {
    let server = ServerBuilder::new(1, "s").start("./start.sh").build();

    assert_eq!(render("", &server.start_command, &server, Path::new("/w")), "");
    assert_eq!(render("{command}", "", &server, Path::new("/w")), "");
}

#[test]
fn server_dir_is_relative_to_work_path() {
    let server = ServerBuilder::new(1, "/abs/looking").build();
    assert_eq!(server_dir(Path::new("/w"), &server), Path::new("/w/abs/looking"));
}

#[test]
fn task_verbs_map_to_command_codes() {
    let table = [
        (TaskCommand::Start, ServerCommand::Start, 1),
        (TaskCommand::Stop, ServerCommand::Stop, 5),
        (TaskCommand::Restart, ServerCommand::Restart, 7),
        (TaskCommand::Update, ServerCommand::Update, 8),
        (TaskCommand::Reinstall, ServerCommand::Reinstall, 10),
    ];

    for (verb, command, code) in table {
        assert_eq!(ServerCommand::from(verb), command);
        assert_eq!(command.code(), code);
        assert_eq!(ServerCommand::from_code(code), Some(command));
    }
    assert_eq!(ServerCommand::from_code(0), None);
    assert_eq!(ServerCommand::from_code(12), None);
}
