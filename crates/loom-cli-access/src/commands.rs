// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::io::Write;

use clap::Subcommand;
use loom_server_access::{AccessControl, Effect, SubjectKind};
use serde::Serialize;
use serde_json::json;

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Print whether a user may see a path
	Check(CheckArgs),
	/// Print the decision for a path and the rule that produced it
	Explain(CheckArgs),
	/// Add a user to the allow side of a rule
	AllowUser(RuleMemberArgs),
	/// Add a user to the deny side of a rule
	DenyUser(RuleMemberArgs),
	/// Add a group to the allow side of a rule
	AllowGroup(RuleMemberArgs),
	/// Add a group to the deny side of a rule
	DenyGroup(RuleMemberArgs),
	/// Remove a user from the allow side of a rule
	RemoveAllowUser(RuleMemberArgs),
	/// Remove a user from the deny side of a rule
	RemoveDenyUser(RuleMemberArgs),
	/// Remove a group from the allow side of a rule
	RemoveAllowGroup(RuleMemberArgs),
	/// Remove a group from the deny side of a rule
	RemoveDenyGroup(RuleMemberArgs),
	/// Add a user to a group
	GroupAdd(GroupMemberArgs),
	/// Remove a user from a group
	GroupRemove(GroupMemberArgs),
	/// Print the rule attached to exactly one path
	Rule(RulePathArgs),
	/// Print every rule, or the rules of one source
	Rules(RulesArgs),
	/// Print every group with its members
	Groups,
	/// Remove a user from every rule and group
	PurgeUser(PurgeUserArgs),
}

#[derive(Debug, Clone, clap::Args)]
pub struct CheckArgs {
	pub source: String,
	pub path: String,
	pub user: String,
}

#[derive(Debug, Clone, clap::Args)]
pub struct RuleMemberArgs {
	pub source: String,
	pub path: String,
	/// Username or group name, depending on the command
	pub name: String,
}

#[derive(Debug, Clone, clap::Args)]
pub struct GroupMemberArgs {
	pub group: String,
	pub user: String,
}

#[derive(Debug, Clone, clap::Args)]
pub struct RulePathArgs {
	pub source: String,
	pub path: String,
}

#[derive(Debug, Clone, clap::Args)]
pub struct RulesArgs {
	/// Only print rules for this source
	#[arg(long)]
	pub source: Option<String>,
}

#[derive(Debug, Clone, clap::Args)]
pub struct PurgeUserArgs {
	pub user: String,
}

pub fn run(command: Command, access: &AccessControl, out: &mut impl Write) -> anyhow::Result<()> {
	match command {
		Command::Check(args) => {
			let permitted = access.permitted(&args.source, &args.path, &args.user);
			print_json(out, &json!({ "permitted": permitted }))
		}
		Command::Explain(args) => {
			let resolution = access.explain(&args.source, &args.path, &args.user);
			print_json(
				out,
				&json!({
					"permitted": resolution.is_permitted(),
					"decision": resolution.decision,
					"rule_path": resolution.rule_path,
				}),
			)
		}
		Command::AllowUser(args) => add(access, args, Effect::Allow, SubjectKind::User),
		Command::DenyUser(args) => add(access, args, Effect::Deny, SubjectKind::User),
		Command::AllowGroup(args) => add(access, args, Effect::Allow, SubjectKind::Group),
		Command::DenyGroup(args) => add(access, args, Effect::Deny, SubjectKind::Group),
		Command::RemoveAllowUser(args) => remove(access, out, args, Effect::Allow, SubjectKind::User),
		Command::RemoveDenyUser(args) => remove(access, out, args, Effect::Deny, SubjectKind::User),
		Command::RemoveAllowGroup(args) => {
			remove(access, out, args, Effect::Allow, SubjectKind::Group)
		}
		Command::RemoveDenyGroup(args) => remove(access, out, args, Effect::Deny, SubjectKind::Group),
		Command::GroupAdd(args) => {
			access.add_user_to_group(&args.group, &args.user)?;
			Ok(())
		}
		Command::GroupRemove(args) => {
			let removed = access.remove_user_from_group(&args.group, &args.user)?;
			print_json(out, &json!({ "removed": removed }))
		}
		Command::Rule(args) => print_json(out, &access.get_rule(&args.source, &args.path)),
		Command::Rules(args) => match args.source {
			Some(source) => print_json(out, &access.rules_for_source(&source)),
			None => print_json(out, &access.all_rules()),
		},
		Command::Groups => print_json(out, &access.all_groups()),
		Command::PurgeUser(args) => {
			let changed = access.remove_user(&args.user)?;
			print_json(out, &json!({ "changed": changed }))
		}
	}
}

fn add(
	access: &AccessControl,
	args: RuleMemberArgs,
	effect: Effect,
	kind: SubjectKind,
) -> anyhow::Result<()> {
	access.add_member(&args.source, &args.path, effect, kind, &args.name)?;
	Ok(())
}

fn remove(
	access: &AccessControl,
	out: &mut impl Write,
	args: RuleMemberArgs,
	effect: Effect,
	kind: SubjectKind,
) -> anyhow::Result<()> {
	let removed = access.drop_member(&args.source, &args.path, effect, kind, &args.name)?;
	print_json(out, &json!({ "removed": removed }))
}

fn print_json<T: Serialize + ?Sized>(out: &mut impl Write, value: &T) -> anyhow::Result<()> {
	serde_json::to_writer_pretty(&mut *out, value)?;
	writeln!(out)?;
	Ok(())
}
