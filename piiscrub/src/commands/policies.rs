// piiscrub/src/commands/policies.rs
//! `piiscrub policies list | sign | verify`.

use anyhow::{bail, Context, Result};
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::Table;
use std::fs;

use piiscrub_core::{list_available_policies, sign_policy, Policy};

use crate::cli::PoliciesCommand;
use crate::commands::{read_key_file, success_msg, warn_msg, write_output};
use crate::ui::theme::ThemeMap;

pub fn run_policies(cmd: PoliciesCommand, quiet: bool, theme: &ThemeMap) -> Result<()> {
    match cmd {
        PoliciesCommand::List => {
            let policies = list_available_policies();
            if policies.is_empty() {
                if !quiet {
                    warn_msg("No policies found.", theme);
                }
                return Ok(());
            }

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL_CONDENSED)
                .set_header(vec!["Name", "Version", "Signed", "Description", "Path"]);
            for p in policies {
                table.add_row(vec![
                    p.policy_name,
                    p.version,
                    if p.signed { "yes".to_string() } else { "no".to_string() },
                    p.description.unwrap_or_default(),
                    p.path.map(|p| p.display().to_string()).unwrap_or_default(),
                ]);
            }
            write_output(None, &format!("{}\n", table))
        }
        PoliciesCommand::Sign { path, key_file } => {
            let key = read_key_file(&key_file)?;
            sign_policy(&path, &key)?;
            if !quiet {
                success_msg(format!("Signed policy {}", path.display()), theme);
            }
            Ok(())
        }
        PoliciesCommand::Verify { path, key_file } => {
            let key = read_key_file(&key_file)?;
            let raw = fs::read(&path)
                .with_context(|| format!("Failed to read policy file {}", path.display()))?;
            let policy: Policy = serde_yml::from_slice(&raw)
                .with_context(|| format!("Failed to parse policy file {}", path.display()))?;
            if policy.signature.is_none() {
                bail!("Policy '{}' is not signed", policy.policy_name);
            }
            policy.verify_signature(&raw, &key)?;
            if !quiet {
                success_msg(format!("Signature of policy '{}' is valid.", policy.policy_name), theme);
            }
            Ok(())
        }
    }
}
