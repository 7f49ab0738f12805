//! Base setup: host packages, LXD and the router container

use serde::{Deserialize, Serialize};

use super::builder::{ShellScript, VyosScript};

/// Packages installed on every host
pub const APT_PACKAGES: [&str; 6] = ["python3-pip", "net-tools", "tmux", "curl", "unzip", "jq"];

const LXD_PRESEED: &str = "\
config:
  images.auto_update_cached: false
storage_pools:
- name: default
  driver: dir
profiles:
- devices:
    root:
      path: /
      pool: default
      type: disk
  name: default
";

const ROUTER_PROFILE: &str = "\
architecture: x86_64
config:
  limits.cpu: '1'
  limits.memory: 2048MiB
devices:
  eth0:
    nictype: physical
    parent: ens6
    type: nic
  eth1:
    nictype: physical
    parent: ens7
    type: nic
";

/// Where the router image comes from and which credentials to set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseSetupOptions {
    #[serde(default = "default_image_bucket")]
    pub image_bucket: String,

    #[serde(default = "default_image_region")]
    pub image_region: String,

    #[serde(default = "default_image_key")]
    pub image_key: String,

    /// Password for the host `ubuntu` user
    #[serde(default = "default_password")]
    pub host_password: String,

    /// Password for the router `vyos` user
    #[serde(default = "default_password")]
    pub router_password: String,
}

fn default_image_bucket() -> String {
    "fra-vyos-bucket".to_string()
}

fn default_image_region() -> String {
    "us-east-1".to_string()
}

fn default_image_key() -> String {
    "vyos_dxgl-1.3.3-bc64a3a-5_lxd_amd64.tar.gz".to_string()
}

fn default_password() -> String {
    "aws123".to_string()
}

impl Default for BaseSetupOptions {
    fn default() -> Self {
        Self {
            image_bucket: default_image_bucket(),
            image_region: default_image_region(),
            image_key: default_image_key(),
            host_password: default_password(),
            router_password: default_password(),
        }
    }
}

/// Host script for the base setup phase; identical for every router
pub fn base_setup_script(options: &BaseSetupOptions) -> ShellScript {
    let mut script = ShellScript::new();

    script
        .apt_install(APT_PACKAGES)
        .blank()
        .comment("snapd must be seeded before any snap operation")
        .snap_install("lxd", false)
        .snap_install("aws-cli", true)
        .blank()
        .line(format!("echo \"ubuntu:{}\" | chpasswd", options.host_password))
        .blank()
        .comment("LXD init preseed")
        .file("/tmp/lxd.yaml", LXD_PRESEED)
        .line("cat /tmp/lxd.yaml | lxd init --preseed || true")
        .blank()
        .comment("Router image")
        .line(format!(
            "aws --region {} s3 cp s3://{}/{} /tmp/vyos.tar.gz",
            options.image_region, options.image_bucket, options.image_key
        ))
        .line("lxc image import /tmp/vyos.tar.gz --alias vyos 2>/dev/null || true")
        .blank()
        .comment("Router container profile")
        .file("/tmp/router.yaml", ROUTER_PROFILE)
        .blank()
        .comment("Recreate the router container from scratch")
        .line("lxc stop router --force 2>/dev/null || true")
        .line("lxc delete router 2>/dev/null || true")
        .line("cat /tmp/router.yaml | lxc init vyos router")
        .blank()
        .file("/tmp/config.boot", config_boot(&options.router_password))
        .line("lxc file push /tmp/config.boot router/opt/vyatta/etc/config/config.boot")
        .line("lxc start router")
        .line("sleep 30")
        .blank()
        .comment("Outside/inside addressing over DHCP")
        .run_in_router("vyos-phase1", &dhcp_script());

    script
}

fn dhcp_script() -> VyosScript {
    let mut vyos = VyosScript::new();
    vyos.section("Outside")
        .set("interfaces ethernet eth0 description 'OUTSIDE'")
        .set("interfaces ethernet eth0 address dhcp")
        .set("interfaces ethernet eth0 dhcp-options default-route-distance 10")
        .section("Inside")
        .set("interfaces ethernet eth1 description 'INSIDE'")
        .set("interfaces ethernet eth1 address dhcp")
        .set("interfaces ethernet eth1 dhcp-options no-default-route");
    vyos
}

fn config_boot(router_password: &str) -> String {
    format!(
        r#"interfaces {{
    ethernet eth0 {{
        address dhcp
        description OUTSIDE
    }}
    ethernet eth1 {{
        address dhcp
        description INSIDE
    }}
    loopback lo {{
    }}
}}
system {{
    config-management {{
        commit-revisions 100
    }}
    host-name vyos
    login {{
        user vyos {{
            authentication {{
                plaintext-password "{}"
            }}
        }}
    }}
    syslog {{
        global {{
            facility all {{
                level info
            }}
        }}
    }}
}}
"#,
        router_password
    )
}
