use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    entity::{prelude::*, user::DEFAULT_AVATAR},
    error::{required, ValidationError},
    ids::{ItemId, PostId, ReplyId, UserId},
    service::{
        board, items,
        password::{hash_password, verify_password},
    },
    time,
};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Error)]
pub enum AccountsServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("user not found")]
    UserNotFound,

    #[error("that username is taken")]
    UsernameTaken,

    #[error("that email is already registered")]
    EmailTaken,

    #[error("login failed, check email and password")]
    InvalidCredentials,

    #[error("current password is incorrect")]
    WrongPassword,

    #[error("forbidden: admin only")]
    Forbidden,

    #[error("admins cannot delete their own account")]
    CannotDeleteSelf,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub contact: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileForm {
    pub username: String,
    pub email: String,
    pub contact: String,
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

/// Row returned by the user search box.
#[derive(Debug, Clone, Serialize)]
pub struct UserSearchHit {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub avatar: String,
}

fn validate_username(username: &str) -> Result<String, ValidationError> {
    let username = required("username", username)?;
    let len = username.chars().count();
    if !(2..=20).contains(&len) {
        return Err(ValidationError::new(
            "username must be between 2 and 20 characters",
        ));
    }
    Ok(username)
}

fn validate_email(email: &str) -> Result<String, ValidationError> {
    let email = required("email", email)?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(ValidationError::new("invalid email address")),
    }
}

fn confirm_password(password: &str, confirm: &str) -> Result<(), ValidationError> {
    if password != confirm {
        return Err(ValidationError::new("passwords do not match"));
    }
    Ok(())
}

/// Only a profile password change enforces the minimum length.
fn validate_new_password(password: &str, confirm: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::new(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    confirm_password(password, confirm)
}

fn new_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[derive(Clone)]
pub struct AccountsService {
    db: DatabaseConnection,
}

impl AccountsService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn ensure_unique(
        &self,
        username: &str,
        email: &str,
        except: Option<UserId>,
    ) -> Result<(), AccountsServiceError> {
        let mut by_name = User::find().filter(UserColumn::Username.eq(username));
        let mut by_email = User::find().filter(UserColumn::Email.eq(email));
        if let Some(id) = except {
            by_name = by_name.filter(UserColumn::Id.ne(id));
            by_email = by_email.filter(UserColumn::Id.ne(id));
        }

        if by_name.one(&self.db).await?.is_some() {
            return Err(AccountsServiceError::UsernameTaken);
        }
        if by_email.one(&self.db).await?.is_some() {
            return Err(AccountsServiceError::EmailTaken);
        }
        Ok(())
    }

    pub async fn register(&self, form: RegisterForm) -> Result<UserModel, AccountsServiceError> {
        let username = validate_username(&form.username)?;
        let email = validate_email(&form.email)?;
        let contact = required("contact", &form.contact)?;
        required("password", &form.password)?;
        confirm_password(&form.password, &form.confirm_password)?;

        self.ensure_unique(&username, &email, None).await?;

        let user = UserActiveModel {
            id: Set(UserId::new()),
            username: Set(username),
            email: Set(email),
            password: Set(hash_password(&form.password)),
            contact: Set(contact),
            avatar: Set(DEFAULT_AVATAR.to_string()),
            is_admin: Set(false),
            sales_count: Set(0),
            date_joined: Set(time::now()),
        };

        let user = User::insert(user).exec_with_returning(&self.db).await?;
        info!(user = %user.id, username = %user.username, "registered user");
        Ok(user)
    }

    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<UserModel, AccountsServiceError> {
        let user = User::find()
            .filter(UserColumn::Email.eq(email.trim()))
            .one(&self.db)
            .await?;

        match user {
            Some(user) if verify_password(password, &user.password) => Ok(user),
            _ => {
                warn!(email = %email.trim(), "failed login");
                Err(AccountsServiceError::InvalidCredentials)
            }
        }
    }

    pub async fn create_session(
        &self,
        user_id: UserId,
        ttl_hours: i64,
    ) -> Result<SessionModel, AccountsServiceError> {
        let session = SessionActiveModel {
            token: Set(new_session_token()),
            user_id: Set(user_id),
            created_at: Set(time::now()),
            expires_at: Set(time::hours_from_now(ttl_hours)),
        };

        Ok(Session::insert(session).exec_with_returning(&self.db).await?)
    }

    /// The user behind a live session token. Expired sessions are removed.
    pub async fn resolve_session(
        &self,
        token: &str,
    ) -> Result<Option<UserModel>, AccountsServiceError> {
        let Some(session) = Session::find_by_id(token.to_string()).one(&self.db).await? else {
            return Ok(None);
        };

        if session.expires_at <= time::now() {
            session.delete(&self.db).await?;
            return Ok(None);
        }

        Ok(User::find_by_id(session.user_id).one(&self.db).await?)
    }

    pub async fn end_session(&self, token: &str) -> Result<(), AccountsServiceError> {
        Session::delete_by_id(token.to_string())
            .exec(&self.db)
            .await?;
        Ok(())
    }

    pub async fn purge_expired_sessions(&self) -> Result<u64, AccountsServiceError> {
        let result = Session::delete_many()
            .filter(SessionColumn::ExpiresAt.lte(time::now()))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn get_user(&self, user_id: UserId) -> Result<UserModel, AccountsServiceError> {
        User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AccountsServiceError::UserNotFound)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<UserModel, AccountsServiceError> {
        User::find()
            .filter(UserColumn::Username.eq(username))
            .one(&self.db)
            .await?
            .ok_or(AccountsServiceError::UserNotFound)
    }

    /// Case-insensitive substring match on username, excluding `exclude`.
    /// An empty query lists everyone else.
    pub async fn search_users(
        &self,
        query: &str,
        exclude: UserId,
    ) -> Result<Vec<UserSearchHit>, AccountsServiceError> {
        let mut select = User::find()
            .filter(UserColumn::Id.ne(exclude))
            .order_by_asc(UserColumn::Username);

        let query = query.trim();
        if !query.is_empty() {
            select = select.filter(UserColumn::Username.contains(query));
        }

        let users = select.all(&self.db).await?;
        Ok(users
            .into_iter()
            .map(|user| UserSearchHit {
                id: user.id,
                username: user.username,
                email: user.email,
                avatar: user.avatar,
            })
            .collect())
    }

    pub async fn update_profile(
        &self,
        user_id: UserId,
        form: ProfileForm,
    ) -> Result<UserModel, AccountsServiceError> {
        let user = self.get_user(user_id).await?;

        let username = validate_username(&form.username)?;
        let email = validate_email(&form.email)?;
        let contact = required("contact", &form.contact)?;
        self.ensure_unique(&username, &email, Some(user_id)).await?;

        let changing_password = !form.current_password.is_empty()
            || !form.new_password.is_empty()
            || !form.confirm_password.is_empty();

        let new_hash = if changing_password {
            if !verify_password(&form.current_password, &user.password) {
                return Err(AccountsServiceError::WrongPassword);
            }
            validate_new_password(&form.new_password, &form.confirm_password)?;
            Some(hash_password(&form.new_password))
        } else {
            None
        };

        let mut active: UserActiveModel = user.into();
        active.username = Set(username);
        active.email = Set(email);
        active.contact = Set(contact);
        if let Some(hash) = new_hash {
            active.password = Set(hash);
        }

        Ok(active.update(&self.db).await?)
    }

    /// Create an administrator, or promote the account already using `email`.
    pub async fn create_admin(
        &self,
        username: &str,
        email: &str,
        contact: &str,
        password: &str,
    ) -> Result<UserModel, AccountsServiceError> {
        if let Some(existing) = User::find()
            .filter(UserColumn::Email.eq(email.trim()))
            .one(&self.db)
            .await?
        {
            if existing.is_admin {
                info!(user = %existing.id, "admin already exists");
                return Ok(existing);
            }
            let mut active: UserActiveModel = existing.into();
            active.is_admin = Set(true);
            let admin = active.update(&self.db).await?;
            info!(user = %admin.id, "promoted user to admin");
            return Ok(admin);
        }

        let user = self
            .register(RegisterForm {
                username: username.to_string(),
                email: email.to_string(),
                contact: contact.to_string(),
                password: password.to_string(),
                confirm_password: password.to_string(),
            })
            .await?;

        let mut active: UserActiveModel = user.into();
        active.is_admin = Set(true);
        let admin = active.update(&self.db).await?;
        info!(user = %admin.id, "created admin");
        Ok(admin)
    }

    /// Remove a user and everything that hangs off them. Admin only.
    pub async fn delete_user(
        &self,
        actor: &UserModel,
        target: UserId,
    ) -> Result<(), AccountsServiceError> {
        if !actor.is_admin {
            return Err(AccountsServiceError::Forbidden);
        }
        if actor.id == target {
            return Err(AccountsServiceError::CannotDeleteSelf);
        }
        self.purge_user(target).await
    }

    /// Unchecked removal, used by the admin CLI.
    pub async fn purge_user(&self, target: UserId) -> Result<(), AccountsServiceError> {
        let user = self.get_user(target).await?;
        let txn = self.db.begin().await?;

        let reply_ids = Reply::find()
            .select_only()
            .column(ReplyColumn::Id)
            .filter(ReplyColumn::UserId.eq(target))
            .into_tuple::<ReplyId>()
            .all(&txn)
            .await?;
        board::remove_replies(&txn, reply_ids).await?;

        let post_ids = Post::find()
            .select_only()
            .column(PostColumn::Id)
            .filter(PostColumn::UserId.eq(target))
            .into_tuple::<PostId>()
            .all(&txn)
            .await?;
        board::remove_posts(&txn, post_ids).await?;

        Like::delete_many()
            .filter(LikeColumn::UserId.eq(target))
            .exec(&txn)
            .await?;
        ReplyLike::delete_many()
            .filter(ReplyLikeColumn::UserId.eq(target))
            .exec(&txn)
            .await?;

        let item_ids = Item::find()
            .select_only()
            .column(ItemColumn::Id)
            .filter(ItemColumn::UserId.eq(target))
            .into_tuple::<ItemId>()
            .all(&txn)
            .await?;
        items::remove_items(&txn, item_ids).await?;

        Follow::delete_many()
            .filter(FollowColumn::UserId.eq(target))
            .exec(&txn)
            .await?;
        Comment::delete_many()
            .filter(CommentColumn::UserId.eq(target))
            .exec(&txn)
            .await?;
        Request::delete_many()
            .filter(RequestColumn::UserId.eq(target))
            .exec(&txn)
            .await?;
        Stock::delete_many()
            .filter(StockColumn::UserId.eq(target))
            .exec(&txn)
            .await?;
        UserFollow::delete_many()
            .filter(
                Condition::any()
                    .add(UserFollowColumn::FollowerId.eq(target))
                    .add(UserFollowColumn::FollowedId.eq(target)),
            )
            .exec(&txn)
            .await?;
        Message::delete_many()
            .filter(
                Condition::any()
                    .add(MessageColumn::SenderId.eq(target))
                    .add(MessageColumn::ReceiverId.eq(target)),
            )
            .exec(&txn)
            .await?;
        Notification::delete_many()
            .filter(
                Condition::any()
                    .add(NotificationColumn::UserId.eq(target))
                    .add(NotificationColumn::SenderId.eq(target)),
            )
            .exec(&txn)
            .await?;
        Session::delete_many()
            .filter(SessionColumn::UserId.eq(target))
            .exec(&txn)
            .await?;

        let (id, username) = (user.id, user.username.clone());
        user.delete(&txn).await?;
        txn.commit().await?;

        info!(user = %id, %username, "deleted user");
        Ok(())
    }
}
