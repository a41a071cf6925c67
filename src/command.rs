//! Vendor command dispatch
//!
//! Translates a logical camera command into the vendor-specific HTTP request
//! that realizes it. Command tables are immutable configuration data; the
//! template strings are the de facto wire protocol of each vendor family and
//! are reproduced verbatim for compatibility.

use crate::config::ScanConfig;
use crate::device::DeviceRecord;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// A logical control action, independent of vendor protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraCommand {
    PtzLeft,
    PtzRight,
    PtzUp,
    PtzDown,
    PtzStop,
    ZoomIn,
    ZoomOut,
    Snapshot,
    Reboot,
}

impl CameraCommand {
    pub const ALL: &'static [CameraCommand] = &[
        CameraCommand::PtzLeft,
        CameraCommand::PtzRight,
        CameraCommand::PtzUp,
        CameraCommand::PtzDown,
        CameraCommand::PtzStop,
        CameraCommand::ZoomIn,
        CameraCommand::ZoomOut,
        CameraCommand::Snapshot,
        CameraCommand::Reboot,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CameraCommand::PtzLeft => "ptz_left",
            CameraCommand::PtzRight => "ptz_right",
            CameraCommand::PtzUp => "ptz_up",
            CameraCommand::PtzDown => "ptz_down",
            CameraCommand::PtzStop => "ptz_stop",
            CameraCommand::ZoomIn => "zoom_in",
            CameraCommand::ZoomOut => "zoom_out",
            CameraCommand::Snapshot => "snapshot",
            CameraCommand::Reboot => "reboot",
        }
    }
}

impl fmt::Display for CameraCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CameraCommand {
    type Err = crate::ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|c| c.as_str() == s)
            .copied()
            .ok_or_else(|| crate::ScanError::ParseError(format!("Unknown command: {}", s)))
    }
}

/// Request templates for one vendor family
pub struct CommandTable {
    pub brand: &'static str,
    pub commands: &'static [(CameraCommand, &'static str)],
}

/// Brand token used when no vendor table applies
pub const GENERIC_BRAND: &str = "generic";

/// Vendor command tables. Each defines all nine logical commands;
/// continuous-move stop is always explicit rather than assuming vendor
/// self-termination.
pub const COMMAND_TABLES: &[CommandTable] = &[
    CommandTable {
        brand: "hikvision",
        commands: &[
            (CameraCommand::PtzLeft, "/ISAPI/PTZCtrl/channels/1/continuous?direction=left&speed=25"),
            (CameraCommand::PtzRight, "/ISAPI/PTZCtrl/channels/1/continuous?direction=right&speed=25"),
            (CameraCommand::PtzUp, "/ISAPI/PTZCtrl/channels/1/continuous?direction=up&speed=25"),
            (CameraCommand::PtzDown, "/ISAPI/PTZCtrl/channels/1/continuous?direction=down&speed=25"),
            (CameraCommand::PtzStop, "/ISAPI/PTZCtrl/channels/1/continuous?direction=stop"),
            (CameraCommand::ZoomIn, "/ISAPI/PTZCtrl/channels/1/continuous?zoom=1"),
            (CameraCommand::ZoomOut, "/ISAPI/PTZCtrl/channels/1/continuous?zoom=-1"),
            (CameraCommand::Snapshot, "/ISAPI/Streaming/channels/1/picture"),
            (CameraCommand::Reboot, "/ISAPI/System/reboot"),
        ],
    },
    CommandTable {
        brand: "dahua",
        commands: &[
            (CameraCommand::PtzLeft, "/cgi-bin/ptz.cgi?action=start&channel=1&code=Left&arg1=0&arg2=1"),
            (CameraCommand::PtzRight, "/cgi-bin/ptz.cgi?action=start&channel=1&code=Right&arg1=0&arg2=1"),
            (CameraCommand::PtzUp, "/cgi-bin/ptz.cgi?action=start&channel=1&code=Up&arg1=0&arg2=1"),
            (CameraCommand::PtzDown, "/cgi-bin/ptz.cgi?action=start&channel=1&code=Down&arg1=0&arg2=1"),
            (CameraCommand::PtzStop, "/cgi-bin/ptz.cgi?action=stop&channel=1&code=All"),
            (CameraCommand::ZoomIn, "/cgi-bin/ptz.cgi?action=start&channel=1&code=ZoomTele&arg1=0&arg2=1"),
            (CameraCommand::ZoomOut, "/cgi-bin/ptz.cgi?action=start&channel=1&code=ZoomWide&arg1=0&arg2=1"),
            (CameraCommand::Snapshot, "/cgi-bin/snapshot.cgi?channel=1"),
            (CameraCommand::Reboot, "/cgi-bin/magicBox.cgi?action=reboot"),
        ],
    },
    CommandTable {
        brand: "onvif",
        commands: &[
            (CameraCommand::PtzLeft, "/onvif/PTZ?pan=-50&tilt=0&zoom=0"),
            (CameraCommand::PtzRight, "/onvif/PTZ?pan=50&tilt=0&zoom=0"),
            (CameraCommand::PtzUp, "/onvif/PTZ?pan=0&tilt=50&zoom=0"),
            (CameraCommand::PtzDown, "/onvif/PTZ?pan=0&tilt=-50&zoom=0"),
            (CameraCommand::PtzStop, "/onvif/PTZ?pan=0&tilt=0&zoom=0"),
            (CameraCommand::ZoomIn, "/onvif/PTZ?pan=0&tilt=0&zoom=50"),
            (CameraCommand::ZoomOut, "/onvif/PTZ?pan=0&tilt=0&zoom=-50"),
            (CameraCommand::Snapshot, "/onvif/Snapshot"),
            (CameraCommand::Reboot, "/onvif/Device/Reboot"),
        ],
    },
    CommandTable {
        brand: GENERIC_BRAND,
        commands: &[
            (CameraCommand::PtzLeft, "/cgi-bin/ptz.cgi?move=left"),
            (CameraCommand::PtzRight, "/cgi-bin/ptz.cgi?move=right"),
            (CameraCommand::PtzUp, "/cgi-bin/ptz.cgi?move=up"),
            (CameraCommand::PtzDown, "/cgi-bin/ptz.cgi?move=down"),
            (CameraCommand::PtzStop, "/cgi-bin/ptz.cgi?move=stop"),
            (CameraCommand::ZoomIn, "/cgi-bin/ptz.cgi?zoom=tele"),
            (CameraCommand::ZoomOut, "/cgi-bin/ptz.cgi?zoom=wide"),
            (CameraCommand::Snapshot, "/cgi-bin/snapshot.cgi"),
            (CameraCommand::Reboot, "/cgi-bin/reboot.cgi"),
        ],
    },
];

/// Map a manufacturer display name onto a command-table token. Unset or
/// unrecognized brands dispatch through the generic table; Axis units speak
/// the ONVIF-style interface.
pub fn brand_token(brand: Option<&str>) -> &'static str {
    let brand = match brand {
        Some(b) if !b.is_empty() => b.to_lowercase(),
        _ => return GENERIC_BRAND,
    };

    if brand.contains("hikvision") || brand.contains("海康") {
        "hikvision"
    } else if brand.contains("dahua") || brand.contains("大华") {
        "dahua"
    } else if brand.contains("axis") || brand.contains("安讯士") || brand.contains("onvif") {
        "onvif"
    } else {
        GENERIC_BRAND
    }
}

/// Look up the request template for (brand token, command), falling back to
/// the generic table for unknown brands. `None` means the command is not
/// dispatchable at all.
pub fn resolve_template(token: &str, command: CameraCommand) -> Option<&'static str> {
    let table = COMMAND_TABLES
        .iter()
        .find(|t| t.brand == token)
        .or_else(|| COMMAND_TABLES.iter().find(|t| t.brand == GENERIC_BRAND))?;

    table
        .commands
        .iter()
        .find(|(c, _)| *c == command)
        .map(|&(_, path)| path)
}

/// Issues vendor-specific control requests against registry entries
#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    client: reqwest::Client,
}

impl CommandDispatcher {
    pub fn new(config: &ScanConfig) -> crate::Result<Self> {
        Self::with_timeout(config.command_timeout())
    }

    pub fn with_timeout(timeout: Duration) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("camsweep/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(true)
            .build()?;

        Ok(Self { client })
    }

    /// Send a logical command to a device.
    ///
    /// Resolves the device brand to a vendor table (generic fallback),
    /// attaches Basic Auth when the record carries credentials, and treats
    /// HTTP 200/202 as success. An unresolvable command returns `false`
    /// without any request; network failures return `false`. No retries —
    /// retry policy belongs to the caller.
    pub async fn send_command(&self, device: &DeviceRecord, command: CameraCommand) -> bool {
        let token = brand_token(device.brand.as_deref());
        let template = match resolve_template(token, command) {
            Some(template) => template,
            None => {
                log::warn!("{}: no template for command {}", device.id, command);
                return false;
            }
        };

        let url = format!("{}{}", device.base_url(), template);
        log::debug!("{} -> {} [{}]", command, url, token);

        let mut request = self.client.get(&url);
        if let Some(ref creds) = device.credentials {
            request = request.basic_auth(&creds.username, Some(&creds.password));
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                log::debug!("{} {} -> HTTP {}", device.id, command, status);
                status == 200 || status == 202
            }
            Err(e) => {
                log::debug!("{} {} failed: {}", device.id, command, e);
                false
            }
        }
    }

    /// Probe the device base URL and update its access state: 200 means
    /// open, 401 means reachable but credential-gated, anything else (or a
    /// network failure) means not accessible.
    pub async fn check_access(&self, device: &mut DeviceRecord) -> bool {
        match self.client.get(device.base_url()).send().await {
            Ok(response) => match response.status().as_u16() {
                200 => {
                    device.set_accessible(true);
                    device.set_authorized(true);
                    true
                }
                401 => {
                    device.set_accessible(true);
                    device.set_authorized(false);
                    true
                }
                _ => {
                    device.set_accessible(false);
                    false
                }
            },
            Err(_) => {
                device.set_accessible(false);
                false
            }
        }
    }
}
