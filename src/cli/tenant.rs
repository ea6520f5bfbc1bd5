use anyhow::{Result, bail};

use super::{finish, open_services, parse_flags, sub_command};
use crate::core::execution::ServiceResult;
use crate::core::strategies::TENANT_ROLES;
use crate::core::terminal::{GuideSection, print_success};

pub async fn run_tenant_command(args: &[String]) -> Result<()> {
    let flags = parse_flags(args, 3);
    match sub_command(args) {
        "add" => {
            let services = open_services(&flags).await?;
            let id = flags.id("Tenant")?;
            let name = flags.get("name").unwrap_or(id);
            let result: ServiceResult<_> = services.store.create_tenant(id, name).await.into();
            finish(&flags, result, |t| {
                print_success(&format!("Tenant {} ({}) created", t.id, t.name))
            })
        }
        "list" | "ls" => {
            let services = open_services(&flags).await?;
            let result: ServiceResult<_> = services.store.list_tenants().await.into();
            finish(&flags, result, |tenants| {
                let mut section = GuideSection::new("Tenants");
                for t in tenants {
                    section = section.status(&t.id, &format!("{}  (since {})", t.name, t.created_at));
                }
                if tenants.is_empty() {
                    section = section.text("No tenants yet.");
                }
                section.print();
                println!();
            })
        }
        "user" => {
            let user = flags.require("user")?;
            let role = flags.require("role")?;
            if !TENANT_ROLES.contains(&role) {
                bail!("Role must be one of: {}", TENANT_ROLES.join(", "));
            }
            let services = open_services(&flags).await?;
            let tenant = flags.tenant();
            let result: ServiceResult<_> =
                services.store.set_user_role(tenant, user, role).await.into();
            finish(&flags, result, |_| {
                print_success(&format!("{} is now {} of {}", user, role, tenant))
            })
        }
        "users" => {
            let services = open_services(&flags).await?;
            let tenant = flags.tenant();
            let result: ServiceResult<_> = services
                .store
                .list_tenant_users(tenant, &flags.list("role"))
                .await
                .into();
            finish(&flags, result, |users| {
                let mut section = GuideSection::new(&format!("Users · {}", tenant));
                for u in users {
                    section = section.status(&u.user_id, &u.role);
                }
                if users.is_empty() {
                    section = section.text("No users with a role in this tenant.");
                }
                section.print();
                println!();
            })
        }
        _ => {
            GuideSection::new("allora tenant")
                .command("add <id> [--name <name>]", "Create a tenant")
                .command("list", "List tenants")
                .command("user --user <id> --role <role>", "Grant or change a user's role")
                .command("users [--role a,b]", "List users of a tenant")
                .blank()
                .text(&format!("Roles: {}", TENANT_ROLES.join(", ")))
                .print();
            println!();
            Ok(())
        }
    }
}
