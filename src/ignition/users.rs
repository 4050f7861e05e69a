use super::types::PasswdUser;

/// Login created by the base image when nothing says otherwise.
pub const DEFAULT_USER: &str = "core";

/// Groups a non-default login joins so it can administer the machine.
pub const ADMIN_GROUPS: [&str; 4] = ["sudo", "adm", "wheel", "systemd-journal"];

/// Accounts for `name`, in the order Ignition must apply them.
///
/// A non-default login suppresses the image's `core` account first, then gets
/// the admin groups `core` would have had.
pub fn users(name: &str, ssh_key: &str, uid: u32) -> Vec<PasswdUser> {
    let is_default = name == DEFAULT_USER;
    let keys = vec![ssh_key.to_string()];
    let mut users = Vec::with_capacity(3);

    if !is_default {
        users.push(PasswdUser {
            name: DEFAULT_USER.into(),
            should_exist: Some(false),
            ..PasswdUser::default()
        });
    }

    users.push(PasswdUser {
        name: name.into(),
        ssh_authorized_keys: keys.clone(),
        uid: Some(uid),
        groups: if is_default {
            Vec::new()
        } else {
            ADMIN_GROUPS.iter().map(|g| g.to_string()).collect()
        },
        should_exist: None,
    });

    users.push(PasswdUser {
        name: "root".into(),
        ssh_authorized_keys: keys,
        ..PasswdUser::default()
    });

    users
}
