//! Profile management commands
//!
//! A profile names one bucket on an S3-compatible endpoint together with
//! the catalog database and owner id its media rows are filed under.

use clap::Subcommand;
use comfy_table::{Table, presets};
use serde::Serialize;

use shelf_core::{Error, Profile, ProfileManager};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Profile subcommands for managing bucket connections
#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Add or update a profile
    Set(SetArgs),

    /// List all configured profiles
    List(ListArgs),

    /// Remove a profile
    Remove(RemoveArgs),
}

/// Arguments for the `profile set` command
#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Profile name (e.g., "media", "local")
    pub name: String,

    /// S3 endpoint URL (e.g., "http://localhost:9000")
    pub endpoint: String,

    /// Access key ID
    pub access_key: String,

    /// Secret access key
    pub secret_key: String,

    /// Bucket holding the media
    pub bucket: String,

    /// AWS region (default: us-east-1)
    #[arg(long, default_value = "us-east-1")]
    pub region: String,

    /// Bucket lookup style: auto, path, or dns (default: auto)
    #[arg(long, default_value = "auto")]
    pub bucket_lookup: String,

    /// Catalog database URL
    #[arg(long, default_value = "sqlite://shelf-catalog.db?mode=rwc")]
    pub catalog_url: String,

    /// Owner id catalog rows are filed under
    #[arg(long, default_value = "local")]
    pub owner_id: String,
}

/// Arguments for the `profile list` command
#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Show full details including bucket and catalog
    #[arg(short, long)]
    pub long: bool,
}

/// Arguments for the `profile remove` command
#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    /// Name of the profile to remove
    pub name: String,
}

/// JSON output for profile list
#[derive(Serialize)]
struct ProfileListOutput {
    profiles: Vec<ProfileInfo>,
}

/// Profile information for output (without credentials)
#[derive(Debug, Serialize)]
struct ProfileInfo {
    name: String,
    endpoint: String,
    bucket: String,
    region: String,
    bucket_lookup: String,
    catalog_url: String,
    owner_id: String,
}

impl From<&Profile> for ProfileInfo {
    fn from(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone(),
            endpoint: profile.endpoint.clone(),
            bucket: profile.bucket.clone(),
            region: profile.region.clone(),
            bucket_lookup: profile.bucket_lookup.clone(),
            catalog_url: profile.catalog_url.clone(),
            owner_id: profile.owner_id.clone(),
        }
    }
}

/// JSON output for profile set/remove operations
#[derive(Serialize)]
struct ProfileOperationOutput {
    success: bool,
    profile: String,
    message: String,
}

/// Execute a profile subcommand
pub fn execute(cmd: ProfileCommands, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let manager = match ProfileManager::new() {
        Ok(manager) => manager,
        Err(e) => {
            formatter.error(&format!("Failed to load profiles: {e}"));
            return ExitCode::GeneralError;
        }
    };

    match cmd {
        ProfileCommands::Set(args) => execute_set(args, &manager, &formatter),
        ProfileCommands::List(args) => execute_list(args, &manager, &formatter),
        ProfileCommands::Remove(args) => execute_remove(args, &manager, &formatter),
    }
}

fn execute_set(args: SetArgs, manager: &ProfileManager, formatter: &Formatter) -> ExitCode {
    if args.endpoint.is_empty() {
        formatter.error("Endpoint URL cannot be empty");
        return ExitCode::UsageError;
    }

    if !matches!(args.bucket_lookup.as_str(), "auto" | "path" | "dns") {
        formatter.error("Bucket lookup must be 'auto', 'path', or 'dns'");
        return ExitCode::UsageError;
    }

    if args.owner_id.is_empty() {
        formatter.error("Owner id cannot be empty");
        return ExitCode::UsageError;
    }

    let existed = manager.exists(&args.name).unwrap_or(false);

    let mut profile = Profile::new(
        &args.name,
        &args.endpoint,
        &args.access_key,
        &args.secret_key,
        &args.bucket,
    );
    profile.region = args.region;
    profile.bucket_lookup = args.bucket_lookup;
    profile.catalog_url = args.catalog_url;
    profile.owner_id = args.owner_id;

    match manager.set(profile) {
        Ok(()) => {
            let message = if existed {
                format!("Profile '{}' updated", args.name)
            } else {
                format!("Profile '{}' configured", args.name)
            };
            if formatter.is_json() {
                formatter.json(&ProfileOperationOutput {
                    success: true,
                    profile: args.name,
                    message,
                });
            } else {
                formatter.success(&message);
            }
            ExitCode::Success
        }
        Err(e @ Error::Config(_)) => {
            formatter.error(&e.to_string());
            ExitCode::UsageError
        }
        Err(e) => {
            formatter.error(&format!("Failed to save profile: {e}"));
            ExitCode::GeneralError
        }
    }
}

fn execute_list(args: ListArgs, manager: &ProfileManager, formatter: &Formatter) -> ExitCode {
    let profiles = match manager.list() {
        Ok(profiles) => profiles,
        Err(e) => {
            formatter.error(&format!("Failed to load profiles: {e}"));
            return ExitCode::GeneralError;
        }
    };

    if formatter.is_json() {
        formatter.json(&ProfileListOutput {
            profiles: profiles.iter().map(ProfileInfo::from).collect(),
        });
    } else if profiles.is_empty() {
        formatter.println("No profiles configured.");
    } else if args.long {
        formatter.println(&profile_table(&profiles).to_string());
    } else {
        for profile in &profiles {
            formatter.println(&format!(
                "{:<12} {}/{}",
                profile.name,
                profile.endpoint.trim_end_matches('/'),
                profile.bucket
            ));
        }
    }
    ExitCode::Success
}

fn execute_remove(args: RemoveArgs, manager: &ProfileManager, formatter: &Formatter) -> ExitCode {
    match manager.remove(&args.name) {
        Ok(()) => {
            let message = format!("Profile '{}' removed", args.name);
            if formatter.is_json() {
                formatter.json(&ProfileOperationOutput {
                    success: true,
                    profile: args.name,
                    message,
                });
            } else {
                formatter.success(&message);
            }
            ExitCode::Success
        }
        Err(Error::ProfileNotFound(_)) => {
            formatter.error(&format!("Profile '{}' not found", args.name));
            ExitCode::NotFound
        }
        Err(e) => {
            formatter.error(&format!("Failed to remove profile: {e}"));
            ExitCode::GeneralError
        }
    }
}

fn profile_table(profiles: &[Profile]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_header(["NAME", "ENDPOINT", "BUCKET", "REGION", "LOOKUP", "OWNER", "CATALOG"]);
    for profile in profiles {
        table.add_row([
            profile.name.as_str(),
            profile.endpoint.as_str(),
            profile.bucket.as_str(),
            profile.region.as_str(),
            profile.bucket_lookup.as_str(),
            profile.owner_id.as_str(),
            profile.catalog_url.as_str(),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(subcommand)]
        command: ProfileCommands,
    }

    #[test]
    fn test_set_args_defaults() {
        let harness = Harness::try_parse_from([
            "profile",
            "set",
            "media",
            "http://localhost:9000",
            "accesskey",
            "secretkey",
            "photos",
        ])
        .unwrap();
        let ProfileCommands::Set(args) = harness.command else {
            panic!("expected set");
        };

        assert_eq!(args.bucket, "photos");
        assert_eq!(args.region, "us-east-1");
        assert_eq!(args.bucket_lookup, "auto");
        assert_eq!(args.owner_id, "local");
        assert!(args.catalog_url.starts_with("sqlite://"));
    }

    #[test]
    fn test_set_requires_bucket() {
        assert!(
            Harness::try_parse_from([
                "profile",
                "set",
                "media",
                "http://localhost:9000",
                "accesskey",
                "secretkey",
            ])
            .is_err()
        );
    }

    #[test]
    fn test_profile_info_hides_credentials() {
        let profile = Profile::new("test", "http://localhost:9000", "key", "secret", "photos");
        let info = ProfileInfo::from(&profile);
        let json = serde_json::to_string(&info).unwrap();

        assert_eq!(info.bucket, "photos");
        assert!(!json.contains("secret"));
        assert!(!json.contains("\"key\""));
    }

    #[test]
    fn test_profile_table_lists_every_profile() {
        let profiles = vec![
            Profile::new("a", "http://one:9000", "k", "s", "first"),
            Profile::new("b", "http://two:9000", "k", "s", "second"),
        ];
        let rendered = profile_table(&profiles).to_string();

        assert!(rendered.contains("BUCKET"));
        assert!(rendered.contains("first"));
        assert!(rendered.contains("http://two:9000"));
    }
}
