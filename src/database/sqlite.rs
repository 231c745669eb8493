use std::path::Path;

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::academic::{
    Assignment, AssignmentStatus, AttendanceRecord, AttendanceStatus, Submission,
};
use crate::models::announcement::{Announcement, TargetAudience};
use crate::models::chat::{ChatSession, Message, MessageMetadata, SenderRole};
use crate::models::event::{Event, EventStatus, Schedule, ScheduleStatus};
use crate::models::faq::{Faq, FaqCategory};
use crate::models::fee::{FeePayment, FeeStructure, PaymentStatus};
use crate::models::language::Language;
use crate::models::user::{
    Preferences, PrincipalDetails, Profile, StudentDetails, TeacherDetails, Theme, User, UserRole,
};

#[derive(Debug)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    pub async fn new(database_path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(database_path).parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::DatabaseError(format!("Failed to create database directory: {}", e))
            })?;
        }
        if !Path::new(database_path).exists() {
            std::fs::File::create(database_path).map_err(|e| {
                AppError::DatabaseError(format!("Failed to create database file: {}", e))
            })?;
        }

        let database_url = format!("sqlite:{}", database_path);
        let pool = SqlitePool::connect(&database_url)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect to database: {}", e)))?;

        let db = Self { pool };
        db.create_tables().await?;
        Ok(db)
    }

    /// Single-connection in-memory database, used by tests.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to open memory database: {}", e)))?;
        let db = Self { pool };
        db.create_tables().await?;
        Ok(db)
    }

    async fn create_tables(&self) -> Result<()> {
        // One statement per execute call; SQLite prepares single statements.
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            avatar TEXT,
            phone TEXT,
            address TEXT,
            student_details TEXT,
            teacher_details TEXT,
            principal_details TEXT,
            pref_language TEXT NOT NULL DEFAULT 'en',
            pref_notifications INTEGER NOT NULL DEFAULT 1,
            pref_theme TEXT NOT NULL DEFAULT 'light',
            is_active INTEGER NOT NULL DEFAULT 1,
            last_login TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
            )"#,
    r#"CREATE TABLE IF NOT EXISTS auth_tokens (
            token_id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            token_hash TEXT NOT NULL,
            expires_at TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1
            )"#,
    r#"CREATE TABLE IF NOT EXISTS chat_sessions (
            id TEXT PRIMARY KEY,
            user_id TEXT,
            language TEXT NOT NULL DEFAULT 'en',
            is_active INTEGER NOT NULL DEFAULT 1,
            start_time TEXT NOT NULL,
            end_time TEXT,
            last_activity TEXT NOT NULL,
            message_count INTEGER NOT NULL DEFAULT 0,
            feedback TEXT,
            rating INTEGER
            )"#,
    r#"CREATE INDEX IF NOT EXISTS idx_sessions_language ON chat_sessions (language)"#,
    r#"CREATE INDEX IF NOT EXISTS idx_sessions_start ON chat_sessions (start_time)"#,
    r#"CREATE TABLE IF NOT EXISTS messages (
            id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL,
            content TEXT NOT NULL,
            language TEXT NOT NULL DEFAULT 'en',
            sender TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            confidence REAL,
            intent TEXT,
            entities TEXT,
            processing_time_ms INTEGER
            )"#,
    r#"CREATE INDEX IF NOT EXISTS idx_messages_session ON messages (session_id, timestamp)"#,
    r#"CREATE INDEX IF NOT EXISTS idx_messages_intent ON messages (intent)"#,
    r#"CREATE TABLE IF NOT EXISTS faqs (
            id TEXT PRIMARY KEY,
            question TEXT NOT NULL,
            answer TEXT NOT NULL,
            language TEXT NOT NULL DEFAULT 'en',
            category TEXT NOT NULL DEFAULT 'general',
            keywords TEXT NOT NULL DEFAULT '[]',
            is_active INTEGER NOT NULL DEFAULT 1,
            access_count INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
            )"#,
    r#"CREATE INDEX IF NOT EXISTS idx_faqs_lang_cat ON faqs (language, category)"#,
    r#"CREATE INDEX IF NOT EXISTS idx_faqs_access ON faqs (access_count)"#,
    r#"CREATE TABLE IF NOT EXISTS announcements (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            author_id TEXT NOT NULL,
            target_audience TEXT NOT NULL DEFAULT 'all',
            priority INTEGER NOT NULL DEFAULT 0,
            is_active INTEGER NOT NULL DEFAULT 1,
            publish_at TEXT,
            expires_at TEXT,
            created_at TEXT NOT NULL
            )"#,
    r#"CREATE TABLE IF NOT EXISTS events (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            venue TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'upcoming',
            created_at TEXT NOT NULL
            )"#,
    r#"CREATE TABLE IF NOT EXISTS schedules (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            subject TEXT NOT NULL,
            course TEXT NOT NULL,
            semester INTEGER NOT NULL,
            teacher_id TEXT NOT NULL,
            classroom TEXT NOT NULL,
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'scheduled'
            )"#,
    r#"CREATE TABLE IF NOT EXISTS fee_structures (
            id TEXT PRIMARY KEY,
            course TEXT NOT NULL,
            semester INTEGER NOT NULL,
            academic_year TEXT NOT NULL,
            tuition_fee REAL NOT NULL DEFAULT 0,
            lab_fee REAL NOT NULL DEFAULT 0,
            library_fee REAL NOT NULL DEFAULT 0,
            other_fee REAL NOT NULL DEFAULT 0
            )"#,
    r#"CREATE TABLE IF NOT EXISTS fee_payments (
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            amount REAL NOT NULL,
            method TEXT NOT NULL,
            transaction_id TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            paid_at TEXT NOT NULL
            )"#,
    r#"CREATE TABLE IF NOT EXISTS assignments (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            course TEXT NOT NULL,
            semester INTEGER NOT NULL,
            teacher_id TEXT NOT NULL,
            due_date TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'active',
            created_at TEXT NOT NULL
            )"#,
    r#"CREATE TABLE IF NOT EXISTS submissions (
            id TEXT PRIMARY KEY,
            assignment_id TEXT NOT NULL,
            student_id TEXT NOT NULL,
            submitted_at TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'submitted',
            grade TEXT
            )"#,
    r#"CREATE TABLE IF NOT EXISTS attendance (
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            schedule_id TEXT NOT NULL,
            date TEXT NOT NULL,
            status TEXT NOT NULL
            )"#,
    r#"CREATE INDEX IF NOT EXISTS idx_attendance_student ON attendance (student_id, date)"#,
];

impl SqliteDatabase {
    // ── users ──────────────────────────────────────────────────────────

    pub async fn create_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO users (
                id, email, password_hash, role, first_name, last_name, avatar, phone, address,
                student_details, teacher_details, principal_details,
                pref_language, pref_notifications, pref_theme,
                is_active, last_login, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.profile.first_name)
        .bind(&user.profile.last_name)
        .bind(&user.profile.avatar)
        .bind(&user.profile.phone)
        .bind(&user.profile.address)
        .bind(json_opt(&user.student_details)?)
        .bind(json_opt(&user.teacher_details)?)
        .bind(json_opt(&user.principal_details)?)
        .bind(user.preferences.language.as_str())
        .bind(user.preferences.notifications)
        .bind(theme_code(user.preferences.theme))
        .bind(user.is_active)
        .bind(user.last_login)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.map(map_user).transpose()
    }

    pub async fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(map_user).transpose()
    }

    pub async fn update_user_profile(
        &self,
        id: &Uuid,
        profile: &Profile,
        preferences: &Preferences,
    ) -> Result<()> {
        sqlx::query(
            r#"UPDATE users SET
                first_name = ?, last_name = ?, avatar = ?, phone = ?, address = ?,
                pref_language = ?, pref_notifications = ?, pref_theme = ?, updated_at = ?
            WHERE id = ?"#,
        )
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.avatar)
        .bind(&profile.phone)
        .bind(&profile.address)
        .bind(preferences.language.as_str())
        .bind(preferences.notifications)
        .bind(theme_code(preferences.theme))
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn update_user_password(&self, id: &Uuid, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(Utc::now())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_last_login(&self, id: &Uuid, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
            .bind(at)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn count_users_by_role(&self, role: UserRole) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM users WHERE role = ? AND is_active = 1")
            .bind(role.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("n")?)
    }

    pub async fn recent_users(&self, limit: i64) -> Result<Vec<User>> {
        let rows =
            sqlx::query("SELECT * FROM users WHERE is_active = 1 ORDER BY created_at DESC LIMIT ?")
                .bind(limit)
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(map_user).collect()
    }

    /// Active students per course, from the JSON detail column.
    pub async fn course_distribution(&self) -> Result<Vec<(String, i64)>> {
        let rows = sqlx::query(
            r#"SELECT json_extract(student_details, '$.course') AS course, COUNT(*) AS n
               FROM users
               WHERE role = 'student' AND is_active = 1 AND student_details IS NOT NULL
               GROUP BY course ORDER BY n DESC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .filter_map(|r| {
                let course: Option<String> = r.try_get("course").ok()?;
                let n: i64 = r.try_get("n").ok()?;
                course.map(|c| (c, n))
            })
            .collect())
    }

    /// Student registrations per month of the given year.
    pub async fn monthly_registrations(&self, year: i32) -> Result<Vec<(String, i64)>> {
        let rows = sqlx::query(
            r#"SELECT strftime('%m', created_at) AS month, COUNT(*) AS n
               FROM users
               WHERE role = 'student' AND strftime('%Y', created_at) = ?
               GROUP BY month ORDER BY month"#,
        )
        .bind(year.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|r| Ok((r.try_get("month")?, r.try_get("n")?)))
            .collect()
    }

    // ── auth tokens ────────────────────────────────────────────────────

    pub async fn store_user_token(
        &self,
        user_id: &Uuid,
        token_id: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO auth_tokens (token_id, user_id, token_hash, expires_at, is_active) VALUES (?, ?, ?, ?, 1)",
        )
        .bind(token_id)
        .bind(user_id.to_string())
        .bind(token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn is_token_valid(&self, token_id: &str) -> Result<bool> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM auth_tokens WHERE token_id = ? AND is_active = 1 AND expires_at > ?",
        )
        .bind(token_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        let n: i64 = row.try_get("n")?;
        Ok(n > 0)
    }

    pub async fn revoke_token(&self, token_id: &str) -> Result<()> {
        sqlx::query("UPDATE auth_tokens SET is_active = 0 WHERE token_id = ?")
            .bind(token_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn revoke_all_user_tokens(&self, user_id: &Uuid) -> Result<()> {
        sqlx::query("UPDATE auth_tokens SET is_active = 0 WHERE user_id = ?")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn cleanup_expired_tokens(&self) -> Result<()> {
        sqlx::query("DELETE FROM auth_tokens WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ── chat sessions ──────────────────────────────────────────────────

    pub async fn create_chat_session(
        &self,
        user_id: Option<Uuid>,
        language: Language,
    ) -> Result<ChatSession> {
        let now = Utc::now();
        let session = ChatSession {
            id: Uuid::new_v4(),
            user_id,
            language,
            is_active: true,
            start_time: now,
            end_time: None,
            last_activity: now,
            message_count: 0,
            feedback: None,
            rating: None,
        };
        sqlx::query(
            r#"INSERT INTO chat_sessions
               (id, user_id, language, is_active, start_time, last_activity, message_count)
               VALUES (?, ?, ?, 1, ?, ?, 0)"#,
        )
        .bind(session.id.to_string())
        .bind(session.user_id.map(|u| u.to_string()))
        .bind(session.language.as_str())
        .bind(session.start_time)
        .bind(session.last_activity)
        .execute(&self.pool)
        .await?;
        Ok(session)
    }

    pub async fn get_chat_session(&self, id: &Uuid) -> Result<Option<ChatSession>> {
        let row = sqlx::query("SELECT * FROM chat_sessions WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(map_session).transpose()
    }

    /// Bump the message counter and refresh last_activity.
    pub async fn touch_chat_session(&self, id: &Uuid, added_messages: i64) -> Result<()> {
        sqlx::query(
            "UPDATE chat_sessions SET message_count = message_count + ?, last_activity = ? WHERE id = ?",
        )
        .bind(added_messages)
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn end_chat_session(
        &self,
        id: &Uuid,
        feedback: Option<String>,
        rating: Option<i64>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE chat_sessions SET is_active = 0, end_time = ?, feedback = ?, rating = ? WHERE id = ?",
        )
        .bind(Utc::now())
        .bind(feedback)
        .bind(rating)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn count_sessions(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        language: Option<Language>,
        only_active: bool,
    ) -> Result<i64> {
        let mut sql = String::from("SELECT COUNT(*) AS n FROM chat_sessions WHERE 1=1");
        if start.is_some() {
            sql.push_str(" AND start_time >= ?");
        }
        if end.is_some() {
            sql.push_str(" AND start_time <= ?");
        }
        if language.is_some() {
            sql.push_str(" AND language = ?");
        }
        if only_active {
            sql.push_str(" AND is_active = 1");
        }
        let mut q = sqlx::query(&sql);
        if let Some(s) = start {
            q = q.bind(s);
        }
        if let Some(e) = end {
            q = q.bind(e);
        }
        if let Some(l) = language {
            q = q.bind(l.as_str());
        }
        let row = q.fetch_one(&self.pool).await?;
        Ok(row.try_get("n")?)
    }

    pub async fn session_language_distribution(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<(String, i64)>> {
        let mut sql =
            String::from("SELECT language, COUNT(*) AS n FROM chat_sessions WHERE 1=1");
        if start.is_some() {
            sql.push_str(" AND start_time >= ?");
        }
        if end.is_some() {
            sql.push_str(" AND start_time <= ?");
        }
        sql.push_str(" GROUP BY language ORDER BY n DESC");
        let mut q = sqlx::query(&sql);
        if let Some(s) = start {
            q = q.bind(s);
        }
        if let Some(e) = end {
            q = q.bind(e);
        }
        let rows = q.fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|r| Ok((r.try_get("language")?, r.try_get("n")?)))
            .collect()
    }

    /// Sessions and message totals per calendar day.
    pub async fn daily_session_stats(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<(String, i64, i64)>> {
        let mut sql = String::from(
            "SELECT strftime('%Y-%m-%d', start_time) AS day, COUNT(*) AS sessions, \
             COALESCE(SUM(message_count), 0) AS messages FROM chat_sessions WHERE 1=1",
        );
        if start.is_some() {
            sql.push_str(" AND start_time >= ?");
        }
        if end.is_some() {
            sql.push_str(" AND start_time <= ?");
        }
        sql.push_str(" GROUP BY day ORDER BY day");
        let mut q = sqlx::query(&sql);
        if let Some(s) = start {
            q = q.bind(s);
        }
        if let Some(e) = end {
            q = q.bind(e);
        }
        let rows = q.fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|r| Ok((r.try_get("day")?, r.try_get("sessions")?, r.try_get("messages")?)))
            .collect()
    }

    /// Average duration of completed sessions, in seconds.
    pub async fn average_session_duration_secs(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<f64> {
        let mut sql = String::from(
            "SELECT COALESCE(AVG((julianday(end_time) - julianday(start_time)) * 86400.0), 0.0) AS avg_secs \
             FROM chat_sessions WHERE is_active = 0 AND end_time IS NOT NULL",
        );
        if start.is_some() {
            sql.push_str(" AND start_time >= ?");
        }
        if end.is_some() {
            sql.push_str(" AND start_time <= ?");
        }
        let mut q = sqlx::query(&sql);
        if let Some(s) = start {
            q = q.bind(s);
        }
        if let Some(e) = end {
            q = q.bind(e);
        }
        let row = q.fetch_one(&self.pool).await?;
        Ok(row.try_get("avg_secs")?)
    }

    pub async fn rating_distribution(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<(i64, i64)>> {
        let mut sql = String::from(
            "SELECT rating, COUNT(*) AS n FROM chat_sessions WHERE rating IS NOT NULL",
        );
        if start.is_some() {
            sql.push_str(" AND start_time >= ?");
        }
        if end.is_some() {
            sql.push_str(" AND start_time <= ?");
        }
        sql.push_str(" GROUP BY rating ORDER BY rating");
        let mut q = sqlx::query(&sql);
        if let Some(s) = start {
            q = q.bind(s);
        }
        if let Some(e) = end {
            q = q.bind(e);
        }
        let rows = q.fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|r| Ok((r.try_get("rating")?, r.try_get("n")?)))
            .collect()
    }

    pub async fn average_rating(&self) -> Result<f64> {
        let row = sqlx::query(
            "SELECT COALESCE(AVG(rating), 0.0) AS avg_rating FROM chat_sessions WHERE rating IS NOT NULL",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("avg_rating")?)
    }

    pub async fn feedback_count(&self) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM chat_sessions WHERE feedback IS NOT NULL AND feedback != ''",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("n")?)
    }

    // ── messages ───────────────────────────────────────────────────────

    pub async fn insert_message(&self, message: &Message) -> Result<()> {
        let (confidence, intent, entities, processing) = match &message.metadata {
            Some(m) => (
                Some(m.confidence),
                Some(m.intent.clone()),
                Some(serde_json::to_string(&m.entities)?),
                m.processing_time_ms,
            ),
            None => (None, None, None, None),
        };
        sqlx::query(
            r#"INSERT INTO messages
               (id, session_id, content, language, sender, timestamp, confidence, intent, entities, processing_time_ms)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(message.id.to_string())
        .bind(message.session_id.to_string())
        .bind(&message.content)
        .bind(message.language.as_str())
        .bind(message.sender.as_str())
        .bind(message.timestamp)
        .bind(confidence)
        .bind(intent)
        .bind(entities)
        .bind(processing)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Page of a session's history, ascending by timestamp.
    pub async fn messages_for_session(
        &self,
        session_id: &Uuid,
        page: i64,
        limit: i64,
    ) -> Result<Vec<Message>> {
        let rows = sqlx::query(
            "SELECT * FROM messages WHERE session_id = ? ORDER BY timestamp ASC, id ASC LIMIT ? OFFSET ?",
        )
        .bind(session_id.to_string())
        .bind(limit)
        .bind((page - 1) * limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(map_message).collect()
    }

    pub async fn count_messages_for_session(&self, session_id: &Uuid) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM messages WHERE session_id = ?")
            .bind(session_id.to_string())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("n")?)
    }

    pub async fn count_messages(&self, since: Option<DateTime<Utc>>) -> Result<i64> {
        let mut sql = String::from("SELECT COUNT(*) AS n FROM messages WHERE 1=1");
        if since.is_some() {
            sql.push_str(" AND timestamp >= ?");
        }
        let mut q = sqlx::query(&sql);
        if let Some(s) = since {
            q = q.bind(s);
        }
        let row = q.fetch_one(&self.pool).await?;
        Ok(row.try_get("n")?)
    }

    pub async fn message_counts_by_sender(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        language: Option<Language>,
    ) -> Result<Vec<(String, i64)>> {
        let mut sql = String::from("SELECT sender, COUNT(*) AS n FROM messages WHERE 1=1");
        if start.is_some() {
            sql.push_str(" AND timestamp >= ?");
        }
        if end.is_some() {
            sql.push_str(" AND timestamp <= ?");
        }
        if language.is_some() {
            sql.push_str(" AND language = ?");
        }
        sql.push_str(" GROUP BY sender");
        let mut q = sqlx::query(&sql);
        if let Some(s) = start {
            q = q.bind(s);
        }
        if let Some(e) = end {
            q = q.bind(e);
        }
        if let Some(l) = language {
            q = q.bind(l.as_str());
        }
        let rows = q.fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|r| Ok((r.try_get("sender")?, r.try_get("n")?)))
            .collect()
    }

    pub async fn daily_message_counts(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<(String, i64)>> {
        let mut sql = String::from(
            "SELECT strftime('%Y-%m-%d', timestamp) AS day, COUNT(*) AS n FROM messages WHERE 1=1",
        );
        if start.is_some() {
            sql.push_str(" AND timestamp >= ?");
        }
        if end.is_some() {
            sql.push_str(" AND timestamp <= ?");
        }
        sql.push_str(" GROUP BY day ORDER BY day");
        let mut q = sqlx::query(&sql);
        if let Some(s) = start {
            q = q.bind(s);
        }
        if let Some(e) = end {
            q = q.bind(e);
        }
        let rows = q.fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|r| Ok((r.try_get("day")?, r.try_get("n")?)))
            .collect()
    }

    /// Most common bot-message intents, descending.
    pub async fn common_intents(&self, limit: i64) -> Result<Vec<(String, i64)>> {
        let rows = sqlx::query(
            r#"SELECT intent, COUNT(*) AS n FROM messages
               WHERE sender = 'bot' AND intent IS NOT NULL
               GROUP BY intent ORDER BY n DESC LIMIT ?"#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|r| Ok((r.try_get("intent")?, r.try_get("n")?)))
            .collect()
    }

    // ── faqs ───────────────────────────────────────────────────────────

    pub async fn create_faq(
        &self,
        question: &str,
        answer: &str,
        language: Language,
        category: FaqCategory,
        keywords: &[String],
    ) -> Result<Faq> {
        let now = Utc::now();
        let faq = Faq {
            id: Uuid::new_v4(),
            question: question.to_string(),
            answer: answer.to_string(),
            language,
            category,
            keywords: keywords.to_vec(),
            is_active: true,
            access_count: 0,
            created_at: now,
            updated_at: now,
        };
        sqlx::query(
            r#"INSERT INTO faqs
               (id, question, answer, language, category, keywords, is_active, access_count, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, 1, 0, ?, ?)"#,
        )
        .bind(faq.id.to_string())
        .bind(&faq.question)
        .bind(&faq.answer)
        .bind(faq.language.as_str())
        .bind(faq.category.as_str())
        .bind(serde_json::to_string(&faq.keywords)?)
        .bind(faq.created_at)
        .bind(faq.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(faq)
    }

    pub async fn get_faq(&self, id: &Uuid) -> Result<Option<Faq>> {
        let row = sqlx::query("SELECT * FROM faqs WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(map_faq).transpose()
    }

    pub async fn update_faq(
        &self,
        id: &Uuid,
        question: &str,
        answer: &str,
        language: Language,
        category: FaqCategory,
        keywords: &[String],
    ) -> Result<Option<Faq>> {
        let result = sqlx::query(
            r#"UPDATE faqs SET question = ?, answer = ?, language = ?, category = ?,
               keywords = ?, updated_at = ? WHERE id = ?"#,
        )
        .bind(question)
        .bind(answer)
        .bind(language.as_str())
        .bind(category.as_str())
        .bind(serde_json::to_string(keywords)?)
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_faq(id).await
    }

    pub async fn delete_faq(&self, id: &Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM faqs WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_faqs(
        &self,
        language: Option<Language>,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<Faq>, i64)> {
        let mut sql = String::from("SELECT * FROM faqs WHERE 1=1");
        let mut count_sql = String::from("SELECT COUNT(*) AS n FROM faqs WHERE 1=1");
        if language.is_some() {
            sql.push_str(" AND language = ?");
            count_sql.push_str(" AND language = ?");
        }
        sql.push_str(" ORDER BY access_count DESC, created_at DESC LIMIT ? OFFSET ?");

        let mut q = sqlx::query(&sql);
        let mut cq = sqlx::query(&count_sql);
        if let Some(l) = language {
            q = q.bind(l.as_str());
            cq = cq.bind(l.as_str());
        }
        q = q.bind(limit).bind((page - 1) * limit);

        let rows = q.fetch_all(&self.pool).await?;
        let faqs: Result<Vec<Faq>> = rows.into_iter().map(map_faq).collect();
        let total: i64 = cq.fetch_one(&self.pool).await?.try_get("n")?;
        Ok((faqs?, total))
    }

    /// Active FAQs filtered by language and/or category.
    pub async fn find_active_faqs(
        &self,
        language: Option<Language>,
        category: Option<FaqCategory>,
    ) -> Result<Vec<Faq>> {
        let mut sql = String::from("SELECT * FROM faqs WHERE is_active = 1");
        if language.is_some() {
            sql.push_str(" AND language = ?");
        }
        if category.is_some() {
            sql.push_str(" AND category = ?");
        }
        let mut q = sqlx::query(&sql);
        if let Some(l) = language {
            q = q.bind(l.as_str());
        }
        if let Some(c) = category {
            q = q.bind(c.as_str());
        }
        let rows = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(map_faq).collect()
    }

    pub async fn increment_faq_access(&self, id: &Uuid) -> Result<()> {
        sqlx::query("UPDATE faqs SET access_count = access_count + 1 WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn top_faqs(&self, limit: i64) -> Result<Vec<Faq>> {
        let rows = sqlx::query("SELECT * FROM faqs ORDER BY access_count DESC LIMIT ?")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(map_faq).collect()
    }

    // ── announcements ──────────────────────────────────────────────────

    pub async fn create_announcement(&self, announcement: &Announcement) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO announcements
               (id, title, content, author_id, target_audience, priority, is_active, publish_at, expires_at, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(announcement.id.to_string())
        .bind(&announcement.title)
        .bind(&announcement.content)
        .bind(announcement.author_id.to_string())
        .bind(announcement.target_audience.as_str())
        .bind(announcement.priority)
        .bind(announcement.is_active)
        .bind(announcement.publish_at)
        .bind(announcement.expires_at)
        .bind(announcement.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Active, currently published announcements visible to an audience,
    /// highest priority first.
    pub async fn announcements_for_audience(
        &self,
        audience: TargetAudience,
        limit: i64,
    ) -> Result<Vec<Announcement>> {
        let now = Utc::now();
        let rows = sqlx::query(
            r#"SELECT * FROM announcements
               WHERE is_active = 1
                 AND (target_audience = 'all' OR target_audience = ?)
                 AND (publish_at IS NULL OR publish_at <= ?)
                 AND (expires_at IS NULL OR expires_at >= ?)
               ORDER BY priority DESC, created_at DESC LIMIT ?"#,
        )
        .bind(audience.as_str())
        .bind(now)
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(map_announcement).collect()
    }

    pub async fn recent_announcements(&self, limit: i64) -> Result<Vec<Announcement>> {
        let rows = sqlx::query(
            "SELECT * FROM announcements WHERE is_active = 1 ORDER BY created_at DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(map_announcement).collect()
    }

    pub async fn count_active_announcements(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM announcements WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("n")?)
    }

    // ── events & schedules ─────────────────────────────────────────────

    pub async fn create_event(&self, event: &Event) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO events (id, title, description, start_date, end_date, venue, status, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(event.id.to_string())
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.start_date)
        .bind(event.end_date)
        .bind(&event.venue)
        .bind(event.status.as_str())
        .bind(event.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn upcoming_events(&self, limit: i64) -> Result<Vec<Event>> {
        let rows = sqlx::query(
            "SELECT * FROM events WHERE status = 'upcoming' AND start_date >= ? ORDER BY start_date ASC LIMIT ?",
        )
        .bind(Utc::now())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(map_event).collect()
    }

    pub async fn count_upcoming_events(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM events WHERE status = 'upcoming'")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("n")?)
    }

    pub async fn create_schedule(&self, schedule: &Schedule) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO schedules
               (id, title, subject, course, semester, teacher_id, classroom, start_time, end_time, status)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(schedule.id.to_string())
        .bind(&schedule.title)
        .bind(&schedule.subject)
        .bind(&schedule.course)
        .bind(schedule.semester)
        .bind(schedule.teacher_id.to_string())
        .bind(&schedule.classroom)
        .bind(schedule.start_time)
        .bind(schedule.end_time)
        .bind(schedule.status.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn schedules_for_course(
        &self,
        course: &str,
        semester: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Schedule>> {
        let rows = sqlx::query(
            r#"SELECT * FROM schedules
               WHERE course = ? AND semester = ? AND status = 'scheduled'
                 AND start_time >= ? AND start_time <= ?
               ORDER BY start_time ASC"#,
        )
        .bind(course)
        .bind(semester)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(map_schedule).collect()
    }

    pub async fn schedules_for_teacher(
        &self,
        teacher_id: &Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Schedule>> {
        let rows = sqlx::query(
            r#"SELECT * FROM schedules
               WHERE teacher_id = ? AND status = 'scheduled'
                 AND start_time >= ? AND start_time <= ?
               ORDER BY start_time ASC"#,
        )
        .bind(teacher_id.to_string())
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(map_schedule).collect()
    }

    // ── fees ───────────────────────────────────────────────────────────

    pub async fn create_fee_structure(&self, structure: &FeeStructure) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO fee_structures
               (id, course, semester, academic_year, tuition_fee, lab_fee, library_fee, other_fee)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(structure.id.to_string())
        .bind(&structure.course)
        .bind(structure.semester)
        .bind(&structure.academic_year)
        .bind(structure.tuition_fee)
        .bind(structure.lab_fee)
        .bind(structure.library_fee)
        .bind(structure.other_fee)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn fee_structure_for(
        &self,
        course: &str,
        semester: i64,
    ) -> Result<Option<FeeStructure>> {
        let row = sqlx::query("SELECT * FROM fee_structures WHERE course = ? AND semester = ?")
            .bind(course)
            .bind(semester)
            .fetch_optional(&self.pool)
            .await?;
        row.map(map_fee_structure).transpose()
    }

    pub async fn create_fee_payment(&self, payment: &FeePayment) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO fee_payments (id, student_id, amount, method, transaction_id, status, paid_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(payment.id.to_string())
        .bind(payment.student_id.to_string())
        .bind(payment.amount)
        .bind(&payment.method)
        .bind(&payment.transaction_id)
        .bind(payment.status.as_str())
        .bind(payment.paid_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn payments_for_student(
        &self,
        student_id: &Uuid,
        limit: i64,
    ) -> Result<Vec<FeePayment>> {
        let rows = sqlx::query(
            "SELECT * FROM fee_payments WHERE student_id = ? ORDER BY paid_at DESC LIMIT ?",
        )
        .bind(student_id.to_string())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(map_fee_payment).collect()
    }

    /// Total successfully collected fees and transaction count.
    pub async fn fee_collection_stats(&self) -> Result<(f64, i64)> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(amount), 0) AS total, COUNT(*) AS n FROM fee_payments WHERE status = 'success'",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok((row.try_get("total")?, row.try_get("n")?))
    }

    // ── assignments, submissions, attendance ───────────────────────────

    pub async fn create_assignment(&self, assignment: &Assignment) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO assignments
               (id, title, description, course, semester, teacher_id, due_date, status, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(assignment.id.to_string())
        .bind(&assignment.title)
        .bind(&assignment.description)
        .bind(&assignment.course)
        .bind(assignment.semester)
        .bind(assignment.teacher_id.to_string())
        .bind(assignment.due_date)
        .bind(assignment.status.as_str())
        .bind(assignment.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Active assignments for a course/semester that the student has not
    /// yet submitted, soonest due date first.
    pub async fn pending_assignments_for_student(
        &self,
        student_id: &Uuid,
        course: &str,
        semester: i64,
        limit: i64,
    ) -> Result<Vec<Assignment>> {
        let rows = sqlx::query(
            r#"SELECT a.* FROM assignments a
               WHERE a.course = ? AND a.semester = ? AND a.status = 'active'
                 AND a.due_date >= ?
                 AND NOT EXISTS (
                     SELECT 1 FROM submissions s
                     WHERE s.assignment_id = a.id AND s.student_id = ?
                 )
               ORDER BY a.due_date ASC LIMIT ?"#,
        )
        .bind(course)
        .bind(semester)
        .bind(Utc::now())
        .bind(student_id.to_string())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(map_assignment).collect()
    }

    pub async fn active_assignments_for_teacher(
        &self,
        teacher_id: &Uuid,
    ) -> Result<Vec<Assignment>> {
        let rows = sqlx::query(
            "SELECT * FROM assignments WHERE teacher_id = ? AND status = 'active' ORDER BY due_date ASC",
        )
        .bind(teacher_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(map_assignment).collect()
    }

    pub async fn create_submission(&self, submission: &Submission) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO submissions (id, assignment_id, student_id, submitted_at, status, grade)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(submission.id.to_string())
        .bind(submission.assignment_id.to_string())
        .bind(submission.student_id.to_string())
        .bind(submission.submitted_at)
        .bind(submission.status.as_str())
        .bind(&submission.grade)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Submissions awaiting grading across a teacher's assignments.
    pub async fn pending_grading_count(&self, teacher_id: &Uuid) -> Result<i64> {
        let row = sqlx::query(
            r#"SELECT COUNT(*) AS n FROM submissions s
               JOIN assignments a ON a.id = s.assignment_id
               WHERE a.teacher_id = ? AND s.status = 'submitted'"#,
        )
        .bind(teacher_id.to_string())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("n")?)
    }

    pub async fn record_attendance(&self, record: &AttendanceRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO attendance (id, student_id, schedule_id, date, status) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(record.id.to_string())
        .bind(record.student_id.to_string())
        .bind(record.schedule_id.to_string())
        .bind(record.date)
        .bind(record.status.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn recent_attendance(
        &self,
        student_id: &Uuid,
        limit: i64,
    ) -> Result<Vec<AttendanceRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM attendance WHERE student_id = ? ORDER BY date DESC LIMIT ?",
        )
        .bind(student_id.to_string())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(map_attendance).collect()
    }

    /// Percentage of classes attended (present or late), rounded.
    pub async fn attendance_percentage(&self, student_id: &Uuid) -> Result<i64> {
        let row = sqlx::query(
            r#"SELECT
                 COUNT(*) AS total,
                 SUM(CASE WHEN status IN ('present', 'late') THEN 1 ELSE 0 END) AS present
               FROM attendance WHERE student_id = ?"#,
        )
        .bind(student_id.to_string())
        .fetch_one(&self.pool)
        .await?;
        let total: i64 = row.try_get("total")?;
        let present: i64 = row.try_get::<Option<i64>, _>("present")?.unwrap_or(0);
        if total == 0 {
            return Ok(0);
        }
        Ok(((present as f64 / total as f64) * 100.0).round() as i64)
    }
}

// ── row mapping ────────────────────────────────────────────────────────

fn parse_uuid(raw: String) -> Result<Uuid> {
    Uuid::parse_str(&raw).map_err(|e| AppError::DatabaseError(format!("Invalid uuid: {}", e)))
}

fn parse_language(raw: String) -> Result<Language> {
    Language::from_code(&raw)
        .ok_or_else(|| AppError::DatabaseError(format!("Unknown language code: {}", raw)))
}

fn theme_code(theme: Theme) -> &'static str {
    match theme {
        Theme::Light => "light",
        Theme::Dark => "dark",
    }
}

fn json_opt<T: serde::Serialize>(value: &Option<T>) -> Result<Option<String>> {
    value
        .as_ref()
        .map(|v| serde_json::to_string(v).map_err(Into::into))
        .transpose()
}

fn map_user(row: sqlx::sqlite::SqliteRow) -> Result<User> {
    let role_raw: String = row.try_get("role")?;
    let role = UserRole::from_code(&role_raw)
        .ok_or_else(|| AppError::DatabaseError(format!("Unknown role: {}", role_raw)))?;
    let theme_raw: String = row.try_get("pref_theme")?;
    let theme = match theme_raw.as_str() {
        "dark" => Theme::Dark,
        _ => Theme::Light,
    };

    let student_details: Option<StudentDetails> = row
        .try_get::<Option<String>, _>("student_details")?
        .map(|s| serde_json::from_str(&s))
        .transpose()?;
    let teacher_details: Option<TeacherDetails> = row
        .try_get::<Option<String>, _>("teacher_details")?
        .map(|s| serde_json::from_str(&s))
        .transpose()?;
    let principal_details: Option<PrincipalDetails> = row
        .try_get::<Option<String>, _>("principal_details")?
        .map(|s| serde_json::from_str(&s))
        .transpose()?;

    Ok(User {
        id: parse_uuid(row.try_get("id")?)?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role,
        profile: Profile {
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            avatar: row.try_get("avatar")?,
            phone: row.try_get("phone")?,
            address: row.try_get("address")?,
        },
        student_details,
        teacher_details,
        principal_details,
        preferences: Preferences {
            language: parse_language(row.try_get("pref_language")?)?,
            notifications: row.try_get("pref_notifications")?,
            theme,
        },
        is_active: row.try_get("is_active")?,
        last_login: row.try_get("last_login")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn map_session(row: sqlx::sqlite::SqliteRow) -> Result<ChatSession> {
    let user_id: Option<String> = row.try_get("user_id")?;
    Ok(ChatSession {
        id: parse_uuid(row.try_get("id")?)?,
        user_id: user_id.map(parse_uuid).transpose()?,
        language: parse_language(row.try_get("language")?)?,
        is_active: row.try_get("is_active")?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        last_activity: row.try_get("last_activity")?,
        message_count: row.try_get("message_count")?,
        feedback: row.try_get("feedback")?,
        rating: row.try_get("rating")?,
    })
}

fn map_message(row: sqlx::sqlite::SqliteRow) -> Result<Message> {
    let sender_raw: String = row.try_get("sender")?;
    let sender = SenderRole::from_code(&sender_raw)
        .ok_or_else(|| AppError::DatabaseError(format!("Unknown sender: {}", sender_raw)))?;
    let confidence: Option<f64> = row.try_get("confidence")?;
    let metadata = match confidence {
        Some(confidence) => {
            let entities: Vec<String> = row
                .try_get::<Option<String>, _>("entities")?
                .map(|s| serde_json::from_str(&s))
                .transpose()?
                .unwrap_or_default();
            Some(MessageMetadata {
                confidence,
                intent: row
                    .try_get::<Option<String>, _>("intent")?
                    .unwrap_or_else(|| "general".to_string()),
                entities,
                processing_time_ms: row.try_get("processing_time_ms")?,
            })
        }
        None => None,
    };
    Ok(Message {
        id: parse_uuid(row.try_get("id")?)?,
        session_id: parse_uuid(row.try_get("session_id")?)?,
        content: row.try_get("content")?,
        language: parse_language(row.try_get("language")?)?,
        sender,
        timestamp: row.try_get("timestamp")?,
        metadata,
    })
}

fn map_faq(row: sqlx::sqlite::SqliteRow) -> Result<Faq> {
    let category_raw: String = row.try_get("category")?;
    let category = FaqCategory::from_code(&category_raw)
        .ok_or_else(|| AppError::DatabaseError(format!("Unknown category: {}", category_raw)))?;
    let keywords: Vec<String> = serde_json::from_str(&row.try_get::<String, _>("keywords")?)?;
    Ok(Faq {
        id: parse_uuid(row.try_get("id")?)?,
        question: row.try_get("question")?,
        answer: row.try_get("answer")?,
        language: parse_language(row.try_get("language")?)?,
        category,
        keywords,
        is_active: row.try_get("is_active")?,
        access_count: row.try_get("access_count")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn map_announcement(row: sqlx::sqlite::SqliteRow) -> Result<Announcement> {
    let audience_raw: String = row.try_get("target_audience")?;
    let target_audience = TargetAudience::from_code(&audience_raw)
        .ok_or_else(|| AppError::DatabaseError(format!("Unknown audience: {}", audience_raw)))?;
    Ok(Announcement {
        id: parse_uuid(row.try_get("id")?)?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        author_id: parse_uuid(row.try_get("author_id")?)?,
        target_audience,
        priority: row.try_get("priority")?,
        is_active: row.try_get("is_active")?,
        publish_at: row.try_get("publish_at")?,
        expires_at: row.try_get("expires_at")?,
        created_at: row.try_get("created_at")?,
    })
}

fn map_event(row: sqlx::sqlite::SqliteRow) -> Result<Event> {
    let status_raw: String = row.try_get("status")?;
    let status = EventStatus::from_code(&status_raw)
        .ok_or_else(|| AppError::DatabaseError(format!("Unknown event status: {}", status_raw)))?;
    Ok(Event {
        id: parse_uuid(row.try_get("id")?)?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        venue: row.try_get("venue")?,
        status,
        created_at: row.try_get("created_at")?,
    })
}

fn map_schedule(row: sqlx::sqlite::SqliteRow) -> Result<Schedule> {
    let status_raw: String = row.try_get("status")?;
    let status = ScheduleStatus::from_code(&status_raw).ok_or_else(|| {
        AppError::DatabaseError(format!("Unknown schedule status: {}", status_raw))
    })?;
    Ok(Schedule {
        id: parse_uuid(row.try_get("id")?)?,
        title: row.try_get("title")?,
        subject: row.try_get("subject")?,
        course: row.try_get("course")?,
        semester: row.try_get("semester")?,
        teacher_id: parse_uuid(row.try_get("teacher_id")?)?,
        classroom: row.try_get("classroom")?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        status,
    })
}

fn map_fee_structure(row: sqlx::sqlite::SqliteRow) -> Result<FeeStructure> {
    Ok(FeeStructure {
        id: parse_uuid(row.try_get("id")?)?,
        course: row.try_get("course")?,
        semester: row.try_get("semester")?,
        academic_year: row.try_get("academic_year")?,
        tuition_fee: row.try_get("tuition_fee")?,
        lab_fee: row.try_get("lab_fee")?,
        library_fee: row.try_get("library_fee")?,
        other_fee: row.try_get("other_fee")?,
    })
}

fn map_fee_payment(row: sqlx::sqlite::SqliteRow) -> Result<FeePayment> {
    let status_raw: String = row.try_get("status")?;
    let status = PaymentStatus::from_code(&status_raw).ok_or_else(|| {
        AppError::DatabaseError(format!("Unknown payment status: {}", status_raw))
    })?;
    Ok(FeePayment {
        id: parse_uuid(row.try_get("id")?)?,
        student_id: parse_uuid(row.try_get("student_id")?)?,
        amount: row.try_get("amount")?,
        method: row.try_get("method")?,
        transaction_id: row.try_get("transaction_id")?,
        status,
        paid_at: row.try_get("paid_at")?,
    })
}

fn map_assignment(row: sqlx::sqlite::SqliteRow) -> Result<Assignment> {
    let status_raw: String = row.try_get("status")?;
    let status = AssignmentStatus::from_code(&status_raw).ok_or_else(|| {
        AppError::DatabaseError(format!("Unknown assignment status: {}", status_raw))
    })?;
    Ok(Assignment {
        id: parse_uuid(row.try_get("id")?)?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        course: row.try_get("course")?,
        semester: row.try_get("semester")?,
        teacher_id: parse_uuid(row.try_get("teacher_id")?)?,
        due_date: row.try_get("due_date")?,
        status,
        created_at: row.try_get("created_at")?,
    })
}

fn map_attendance(row: sqlx::sqlite::SqliteRow) -> Result<AttendanceRecord> {
    let status_raw: String = row.try_get("status")?;
    let status = AttendanceStatus::from_code(&status_raw).ok_or_else(|| {
        AppError::DatabaseError(format!("Unknown attendance status: {}", status_raw))
    })?;
    Ok(AttendanceRecord {
        id: parse_uuid(row.try_get("id")?)?,
        student_id: parse_uuid(row.try_get("student_id")?)?,
        schedule_id: parse_uuid(row.try_get("schedule_id")?)?,
        date: row.try_get("date")?,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::SenderRole;

    async fn memory_db() -> SqliteDatabase {
        SqliteDatabase::in_memory().await.unwrap()
    }

    fn message(session_id: Uuid, content: &str, sender: SenderRole) -> Message {
        Message {
            id: Uuid::new_v4(),
            session_id,
            content: content.to_string(),
            language: Language::En,
            sender,
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    #[tokio::test]
    async fn session_round_trip_and_counter() {
        let db = memory_db().await;
        let session = db.create_chat_session(None, Language::Hi).await.unwrap();

        db.touch_chat_session(&session.id, 2).await.unwrap();
        let loaded = db.get_chat_session(&session.id).await.unwrap().unwrap();
        assert_eq!(loaded.language, Language::Hi);
        assert_eq!(loaded.message_count, 2);
        assert!(loaded.is_active);

        db.end_chat_session(&session.id, Some("useful".to_string()), Some(5))
            .await
            .unwrap();
        let ended = db.get_chat_session(&session.id).await.unwrap().unwrap();
        assert!(!ended.is_active);
        assert_eq!(ended.rating, Some(5));
        assert!(ended.end_time.is_some());
    }

    #[tokio::test]
    async fn history_is_ascending_and_idempotent() {
        let db = memory_db().await;
        let session = db.create_chat_session(None, Language::En).await.unwrap();

        for i in 0..5 {
            let mut m = message(session.id, &format!("msg {i}"), SenderRole::User);
            m.timestamp = Utc::now() + chrono::Duration::milliseconds(i);
            db.insert_message(&m).await.unwrap();
        }

        let first = db.messages_for_session(&session.id, 1, 3).await.unwrap();
        let second = db.messages_for_session(&session.id, 1, 3).await.unwrap();
        assert_eq!(first.len(), 3);
        let ids: Vec<Uuid> = first.iter().map(|m| m.id).collect();
        let ids2: Vec<Uuid> = second.iter().map(|m| m.id).collect();
        assert_eq!(ids, ids2);
        assert!(first.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

        let page2 = db.messages_for_session(&session.id, 2, 3).await.unwrap();
        assert_eq!(page2.len(), 2);
        assert_eq!(db.count_messages_for_session(&session.id).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn message_metadata_round_trips() {
        let db = memory_db().await;
        let session = db.create_chat_session(None, Language::En).await.unwrap();
        let mut m = message(session.id, "bot says", SenderRole::Bot);
        m.metadata = Some(MessageMetadata {
            confidence: 0.95,
            intent: "fees".to_string(),
            entities: vec!["2024".to_string()],
            processing_time_ms: Some(12),
        });
        db.insert_message(&m).await.unwrap();

        let loaded = db.messages_for_session(&session.id, 1, 10).await.unwrap();
        let meta = loaded[0].metadata.as_ref().unwrap();
        assert!((meta.confidence - 0.95).abs() < f64::EPSILON);
        assert_eq!(meta.intent, "fees");
        assert_eq!(meta.entities, vec!["2024"]);
    }

    #[tokio::test]
    async fn faq_crud_and_access_counting() {
        let db = memory_db().await;
        let faq = db
            .create_faq(
                "what is the fee",
                "It depends.",
                Language::En,
                FaqCategory::Fees,
                &["fee".to_string()],
            )
            .await
            .unwrap();

        db.increment_faq_access(&faq.id).await.unwrap();
        db.increment_faq_access(&faq.id).await.unwrap();
        let loaded = db.get_faq(&faq.id).await.unwrap().unwrap();
        assert_eq!(loaded.access_count, 2);

        let updated = db
            .update_faq(
                &faq.id,
                "what is the fee structure",
                "See the accounts office.",
                Language::En,
                FaqCategory::Fees,
                &[],
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.question, "what is the fee structure");

        let (listed, total) = db.list_faqs(Some(Language::En), 1, 10).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(listed.len(), 1);

        assert!(db.delete_faq(&faq.id).await.unwrap());
        assert!(!db.delete_faq(&faq.id).await.unwrap());
        assert!(db.get_faq(&faq.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_active_faqs_filters_language_and_category() {
        let db = memory_db().await;
        db.create_faq("q1", "a1", Language::En, FaqCategory::Fees, &[])
            .await
            .unwrap();
        db.create_faq("q2", "a2", Language::Hi, FaqCategory::Fees, &[])
            .await
            .unwrap();
        db.create_faq("q3", "a3", Language::En, FaqCategory::Hostel, &[])
            .await
            .unwrap();

        let en_fees = db
            .find_active_faqs(Some(Language::En), Some(FaqCategory::Fees))
            .await
            .unwrap();
        assert_eq!(en_fees.len(), 1);

        let all_fees = db.find_active_faqs(None, Some(FaqCategory::Fees)).await.unwrap();
        assert_eq!(all_fees.len(), 2);

        let everything = db.find_active_faqs(None, None).await.unwrap();
        assert_eq!(everything.len(), 3);
    }

    #[tokio::test]
    async fn attendance_percentage_counts_late_as_present() {
        let db = memory_db().await;
        let student = Uuid::new_v4();
        let schedule = Uuid::new_v4();
        for status in [
            AttendanceStatus::Present,
            AttendanceStatus::Late,
            AttendanceStatus::Absent,
            AttendanceStatus::Present,
        ] {
            db.record_attendance(&AttendanceRecord {
                id: Uuid::new_v4(),
                student_id: student,
                schedule_id: schedule,
                date: Utc::now(),
                status,
            })
            .await
            .unwrap();
        }
        assert_eq!(db.attendance_percentage(&student).await.unwrap(), 75);
        assert_eq!(db.attendance_percentage(&Uuid::new_v4()).await.unwrap(), 0);
    }
}
