use super::directories::guest_home;
use super::files::LINGER_UNIT_NAME;
use super::types::{Link, Node};

/// Enable the linger placeholder for the user session, and make `docker`
/// resolve to `podman`.
pub fn links(name: &str) -> Vec<Link> {
    let user_units = format!("{}/.config/systemd/user", guest_home(name));
    vec![
        Link {
            node: Node::owned(
                format!("{user_units}/default.target.wants/{LINGER_UNIT_NAME}"),
                name,
            ),
            hard: Some(false),
            target: format!("{user_units}/{LINGER_UNIT_NAME}"),
        },
        Link {
            node: Node::root("/usr/local/bin/docker").overwrite(true),
            hard: Some(false),
            target: "/usr/bin/podman".into(),
        },
    ]
}
