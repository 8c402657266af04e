#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

#[allow(dead_code)]
pub const CMD_TIMEOUT: Duration = Duration::from_secs(15);

pub const SNAPSHOT: &str = r#"{
    "menu": [
        { "id": 2, "menutype": "mainmenu", "title": "Home", "type": "component",
          "link": "index.php?option=com_content&view=featured",
          "published": 1, "access": 1, "home": true, "lft": 1, "component_id": 22 },
        { "id": 3, "menutype": "mainmenu", "title": "Blog", "type": "component",
          "link": "index.php?option=com_content&view=category&id=8",
          "published": 1, "access": 1, "lft": 3, "component_id": 22 },
        { "id": 4, "menutype": "mainmenu", "title": "Draft", "type": "component",
          "link": "index.php?option=com_content&view=article&id=9",
          "published": 0, "access": 1, "lft": 5, "component_id": 22 }
    ],
    "extensions": [ { "extension_id": 22, "element": "com_content", "enabled": true } ],
    "routes": {
        "index.php?Itemid=2": "/",
        "index.php?Itemid=3": "/blog",
        "index.php?Itemid=4": "/draft"
    }
}"#;

pub const ARTICLES: &str = r#"[
    { "loc": "/blog/first-post", "type": "content", "title": "First post",
      "changefreq": "monthly", "priority": "0.6", "lastmod": "2024-03-01" },
    { "loc": "/blog/hidden", "type": "content", "title": "Hidden",
      "exclude": [ { "type": "article", "msg": "Article is unpublished" } ] }
]"#;

pub const CONFIG: &str = r#"
[site]
name = "Example"
root_url = "https://example.com/"

[paths]
site_root = "public"
snapshot = "site.json"
plugins = ["articles.json"]
state_file = "state.json"

[cron]
interval_count = 1
interval_unit = "day"
key_enabled = true
key = "s3cret"
"#;

/// Create a configured `sitemapper` command isolated from the host environment.
#[allow(dead_code)]
pub fn sitemapper_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("sitemapper"));
    cmd.timeout(CMD_TIMEOUT);
    for var in [
        "SITEMAPPER_CONFIG",
        "SITEMAPPER_CRON_KEY",
        "SITEMAPPER_ROOT_URL",
        "SITEMAPPER_SITE_ROOT",
    ] {
        cmd.env_remove(var);
    }
    cmd.env("NO_COLOR", "1");
    cmd
}

/// A site fixture: snapshot, plugin file and `sitemapper.toml` in a temp dir.
#[allow(dead_code)]
pub struct Site {
    pub dir: TempDir,
}

#[allow(dead_code)]
impl Site {
    pub fn new() -> Self {
        Self::with_config(CONFIG)
    }

    pub fn with_config(config: &str) -> Self {
        let dir = tempfile::tempdir().expect("failed to create site dir");
        fs::create_dir(dir.path().join("public")).unwrap();
        fs::write(dir.path().join("site.json"), SNAPSHOT).unwrap();
        fs::write(dir.path().join("articles.json"), ARTICLES).unwrap();
        fs::write(dir.path().join("sitemapper.toml"), config).unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn sitemap(&self) -> PathBuf {
        self.path().join("public").join("sitemap.xml")
    }

    /// Command running inside the site directory so `./sitemapper.toml` is found.
    pub fn cmd(&self) -> Command {
        let mut cmd = sitemapper_cmd();
        cmd.current_dir(self.path())
            .env("HOME", self.path())
            .env("XDG_CONFIG_HOME", self.path());
        cmd
    }
}
