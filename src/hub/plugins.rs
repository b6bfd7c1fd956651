//! Plugin service: a fixed registry of client-side plugin sources. The hub
//! stores the source text and serves it verbatim; the code is opaque here and
//! runs only on the player's machine.

use super::{ConnId, Hub};
use crate::protocol::{
    Frame, MsgType, PluginDescriptor, PluginDownloadReply, PluginDownloadRequest, PluginListReply,
    Status,
};

struct PluginEntry {
    name: &'static str,
    description: &'static str,
    filename: &'static str,
    code: &'static str,
}

/// Built-in plugins shipped with the hub.
const PLUGINS: &[PluginEntry] = &[
    PluginEntry {
        name: "room_chat",
        description: "In-room chat window",
        filename: "room_chat.py",
        code: include_str!("../../assets/plugins/room_chat.py"),
    },
    PluginEntry {
        name: "room_chat_notify",
        description: "In-room chat window with message timestamps and close-safe shutdown",
        filename: "room_chat_notify.py",
        code: include_str!("../../assets/plugins/room_chat_notify.py"),
    },
];

impl Hub {
    pub(crate) fn handle_plugin_list(&mut self, conn: ConnId) {
        let reply = PluginListReply {
            plugins: PLUGINS
                .iter()
                .map(|p| PluginDescriptor {
                    name: p.name.to_string(),
                    description: p.description.to_string(),
                    filename: p.filename.to_string(),
                })
                .collect(),
        };
        self.send(conn, Frame::json(MsgType::PluginListResp, &reply));
    }

    pub(crate) async fn handle_plugin_download(&mut self, conn: ConnId, frame: &Frame) {
        let Some(req) = self.parse_or_close::<PluginDownloadRequest>(conn, frame).await else {
            return;
        };

        let reply = match PLUGINS.iter().find(|p| p.name == req.name) {
            Some(plugin) => PluginDownloadReply {
                status: Status::Ok,
                msg: String::new(),
                code: Some(plugin.code.to_string()),
            },
            None => PluginDownloadReply {
                status: Status::Error,
                msg: format!("Unknown plugin: {}", req.name),
                code: None,
            },
        };
        self.send(conn, Frame::json(MsgType::PluginDownloadResp, &reply));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_serves_nonempty_sources() {
        for plugin in PLUGINS {
            assert!(!plugin.code.trim().is_empty(), "{} is empty", plugin.name);
            assert!(plugin.filename.ends_with(".py"));
        }
    }

    #[test]
    fn plugin_names_are_unique() {
        let mut names: Vec<_> = PLUGINS.iter().map(|p| p.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), PLUGINS.len());
    }
}
