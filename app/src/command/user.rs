use medtrack_core::{NewUser, UserRepo};

use super::init_common_components;

#[derive(Debug, Clone)]
pub enum UserAction {
    Add {
        email: String,
        first_name: Option<String>,
        last_name: Option<String>,
    },
    List,
}

/// Strategy for registering and listing users.
#[derive(Debug, Clone, Copy)]
pub struct UserStrategy;

impl super::CommandStrategy for UserStrategy {
    type Input = UserAction;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let common = init_common_components().await?;

        match input {
            UserAction::Add {
                email,
                first_name,
                last_name,
            } => {
                let user = common
                    .store
                    .create_user(&NewUser {
                        email,
                        first_name,
                        last_name,
                    })
                    .await?;
                println!("Created user {} <{}>", user.id, user.email);
            }
            UserAction::List => {
                let users = common.store.list_users().await?;
                if users.is_empty() {
                    println!("No users yet. Add one with 'medtrack user add --email <email>'.");
                }
                for user in users {
                    let name = [user.first_name, user.last_name]
                        .into_iter()
                        .flatten()
                        .collect::<Vec<_>>()
                        .join(" ");
                    println!("{}  {}  {}", user.id, user.email, name);
                }
            }
        }

        Ok(())
    }
}
