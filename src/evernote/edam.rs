//! EDAM - the Evernote data model and the service calls this tool makes.
//!
//! Evernote exposes its UserStore and NoteStore as Thrift services over
//! HTTP: every request is one strict binary CALL message, every response one
//! REPLY (or EXCEPTION) message. Only the fields we read or write are
//! modelled; everything else in a reply is skipped. Field ids follow the
//! published EDAM IDL.

use crate::error::{NoteError, NoteResult};
use thrift::protocol::{
    TBinaryInputProtocol, TBinaryOutputProtocol, TFieldIdentifier, TInputProtocol,
    TListIdentifier, TMessageIdentifier, TMessageType, TOutputProtocol, TStructIdentifier, TType,
};
use thrift::{ProtocolError, ProtocolErrorKind};

/// `EDAMErrorCode` values carried by EDAM exceptions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdamErrorCode {
    Unknown,
    BadDataFormat,
    PermissionDenied,
    InternalError,
    DataRequired,
    LimitReached,
    QuotaReached,
    InvalidAuth,
    AuthExpired,
    DataConflict,
    EnmlValidation,
    ShardUnavailable,
    LenTooShort,
    LenTooLong,
    TooFew,
    TooMany,
    UnsupportedOperation,
    TakenDown,
    RateLimitReached,
    BusinessSecurityLoginRequired,
    DeviceLimitReached,
    Other(i32),
}

impl EdamErrorCode {
    pub fn from_i32(value: i32) -> Self {
        match value {
            1 => Self::Unknown,
            2 => Self::BadDataFormat,
            3 => Self::PermissionDenied,
            4 => Self::InternalError,
            5 => Self::DataRequired,
            6 => Self::LimitReached,
            7 => Self::QuotaReached,
            8 => Self::InvalidAuth,
            9 => Self::AuthExpired,
            10 => Self::DataConflict,
            11 => Self::EnmlValidation,
            12 => Self::ShardUnavailable,
            13 => Self::LenTooShort,
            14 => Self::LenTooLong,
            15 => Self::TooFew,
            16 => Self::TooMany,
            17 => Self::UnsupportedOperation,
            18 => Self::TakenDown,
            19 => Self::RateLimitReached,
            20 => Self::BusinessSecurityLoginRequired,
            21 => Self::DeviceLimitReached,
            other => Self::Other(other),
        }
    }

    pub fn as_i32(self) -> i32 {
        match self {
            Self::Unknown => 1,
            Self::BadDataFormat => 2,
            Self::PermissionDenied => 3,
            Self::InternalError => 4,
            Self::DataRequired => 5,
            Self::LimitReached => 6,
            Self::QuotaReached => 7,
            Self::InvalidAuth => 8,
            Self::AuthExpired => 9,
            Self::DataConflict => 10,
            Self::EnmlValidation => 11,
            Self::ShardUnavailable => 12,
            Self::LenTooShort => 13,
            Self::LenTooLong => 14,
            Self::TooFew => 15,
            Self::TooMany => 16,
            Self::UnsupportedOperation => 17,
            Self::TakenDown => 18,
            Self::RateLimitReached => 19,
            Self::BusinessSecurityLoginRequired => 20,
            Self::DeviceLimitReached => 21,
            Self::Other(value) => value,
        }
    }

    pub fn name(self) -> String {
        let name = match self {
            Self::Unknown => "UNKNOWN",
            Self::BadDataFormat => "BAD_DATA_FORMAT",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::InternalError => "INTERNAL_ERROR",
            Self::DataRequired => "DATA_REQUIRED",
            Self::LimitReached => "LIMIT_REACHED",
            Self::QuotaReached => "QUOTA_REACHED",
            Self::InvalidAuth => "INVALID_AUTH",
            Self::AuthExpired => "AUTH_EXPIRED",
            Self::DataConflict => "DATA_CONFLICT",
            Self::EnmlValidation => "ENML_VALIDATION",
            Self::ShardUnavailable => "SHARD_UNAVAILABLE",
            Self::LenTooShort => "LEN_TOO_SHORT",
            Self::LenTooLong => "LEN_TOO_LONG",
            Self::TooFew => "TOO_FEW",
            Self::TooMany => "TOO_MANY",
            Self::UnsupportedOperation => "UNSUPPORTED_OPERATION",
            Self::TakenDown => "TAKEN_DOWN",
            Self::RateLimitReached => "RATE_LIMIT_REACHED",
            Self::BusinessSecurityLoginRequired => "BUSINESS_SECURITY_LOGIN_REQUIRED",
            Self::DeviceLimitReached => "DEVICE_LIMIT_REACHED",
            Self::Other(value) => return format!("ERROR_{}", value),
        };
        name.to_string()
    }

    /// Maps the code onto the error taxonomy, `detail` becoming the message
    fn into_error(self, detail: String) -> NoteError {
        match self {
            Self::InvalidAuth | Self::AuthExpired | Self::PermissionDenied => NoteError::Auth(detail),
            Self::QuotaReached | Self::LimitReached => NoteError::Quota(detail),
            Self::EnmlValidation
            | Self::BadDataFormat
            | Self::DataRequired
            | Self::DataConflict
            | Self::LenTooShort
            | Self::LenTooLong
            | Self::TooFew
            | Self::TooMany => NoteError::Validation(detail),
            _ => NoteError::Remote(detail),
        }
    }
}

// ============ CODEC ============

/// Types that serialize themselves as a Thrift struct
pub trait ThriftWrite {
    fn write_to_out_protocol(&self, o: &mut dyn TOutputProtocol) -> thrift::Result<()>;
}

/// Types that deserialize from a Thrift struct, skipping unknown fields
pub trait ThriftRead: Sized {
    fn read_from_in_protocol(i: &mut dyn TInputProtocol) -> thrift::Result<Self>;
}

fn invalid_data(message: impl Into<String>) -> thrift::Error {
    thrift::Error::Protocol(ProtocolError::new(ProtocolErrorKind::InvalidData, message))
}

fn expect_type(actual: TType, expected: TType) -> thrift::Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(invalid_data(format!("expected {:?}, found {:?}", expected, actual)))
    }
}

/// Reads a struct, handing each field to `on_field` until STOP
fn read_fields<F>(i: &mut dyn TInputProtocol, mut on_field: F) -> thrift::Result<()>
where
    F: FnMut(&mut dyn TInputProtocol, TType, i16) -> thrift::Result<()>,
{
    i.read_struct_begin()?;
    loop {
        let field = i.read_field_begin()?;
        if field.field_type == TType::Stop {
            break;
        }
        let id = field.id.ok_or_else(|| invalid_data("field without an id"))?;
        on_field(&mut *i, field.field_type, id)?;
        i.read_field_end()?;
    }
    i.read_struct_end()
}

fn read_list<T>(
    i: &mut dyn TInputProtocol,
    expected: TType,
    read_elem: fn(&mut dyn TInputProtocol) -> thrift::Result<T>,
) -> thrift::Result<Vec<T>> {
    let list = i.read_list_begin()?;
    if list.size > 0 {
        expect_type(list.element_type, expected)?;
    }
    // the declared size is not trusted for preallocation
    let mut items = Vec::new();
    for _ in 0..list.size {
        items.push(read_elem(&mut *i)?);
    }
    i.read_list_end()?;
    Ok(items)
}

fn read_string_elem(i: &mut dyn TInputProtocol) -> thrift::Result<String> {
    i.read_string()
}

fn write_field<F>(
    o: &mut dyn TOutputProtocol,
    name: &str,
    field_type: TType,
    id: i16,
    write_value: F,
) -> thrift::Result<()>
where
    F: FnOnce(&mut dyn TOutputProtocol) -> thrift::Result<()>,
{
    o.write_field_begin(&TFieldIdentifier::new(name, field_type, id))?;
    write_value(&mut *o)?;
    o.write_field_end()
}

fn write_string_field(
    o: &mut dyn TOutputProtocol,
    name: &str,
    id: i16,
    value: &str,
) -> thrift::Result<()> {
    write_field(o, name, TType::String, id, |o| o.write_string(value))
}

fn write_struct_field<T: ThriftWrite>(
    o: &mut dyn TOutputProtocol,
    name: &str,
    id: i16,
    value: &T,
) -> thrift::Result<()> {
    write_field(o, name, TType::Struct, id, |o| value.write_to_out_protocol(o))
}

fn write_string_list_field(
    o: &mut dyn TOutputProtocol,
    name: &str,
    id: i16,
    values: &[String],
) -> thrift::Result<()> {
    write_field(o, name, TType::List, id, |o| {
        let size = i32::try_from(values.len())
            .map_err(|_| invalid_data(format!("too many values in {}", name)))?;
        o.write_list_begin(&TListIdentifier::new(TType::String, size))?;
        for value in values {
            o.write_string(value)?;
        }
        o.write_list_end()
    })
}

// ============ DATA TYPES ============

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notebook {
    pub guid: Option<String>,
    pub name: Option<String>,
    pub default_notebook: Option<bool>,
    pub stack: Option<String>,
}

impl ThriftWrite for Notebook {
    fn write_to_out_protocol(&self, o: &mut dyn TOutputProtocol) -> thrift::Result<()> {
        o.write_struct_begin(&TStructIdentifier::new("Notebook"))?;
        if let Some(guid) = &self.guid {
            write_string_field(o, "guid", 1, guid)?;
        }
        if let Some(name) = &self.name {
            write_string_field(o, "name", 2, name)?;
        }
        if let Some(default_notebook) = self.default_notebook {
            write_field(o, "defaultNotebook", TType::Bool, 6, |o| {
                o.write_bool(default_notebook)
            })?;
        }
        if let Some(stack) = &self.stack {
            write_string_field(o, "stack", 12, stack)?;
        }
        o.write_field_stop()?;
        o.write_struct_end()
    }
}

impl ThriftRead for Notebook {
    fn read_from_in_protocol(i: &mut dyn TInputProtocol) -> thrift::Result<Self> {
        let mut notebook = Self::default();
        read_fields(i, |i, ttype, id| {
            match (id, ttype) {
                (1, TType::String) => notebook.guid = Some(i.read_string()?),
                (2, TType::String) => notebook.name = Some(i.read_string()?),
                (6, TType::Bool) => notebook.default_notebook = Some(i.read_bool()?),
                (12, TType::String) => notebook.stack = Some(i.read_string()?),
                _ => i.skip(ttype)?,
            }
            Ok(())
        })?;
        Ok(notebook)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Note {
    pub guid: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    /// Milliseconds since the epoch
    pub created: Option<i64>,
    pub updated: Option<i64>,
    pub notebook_guid: Option<String>,
    /// Tags by name; the service creates missing ones
    pub tag_names: Option<Vec<String>>,
}

impl ThriftWrite for Note {
    fn write_to_out_protocol(&self, o: &mut dyn TOutputProtocol) -> thrift::Result<()> {
        o.write_struct_begin(&TStructIdentifier::new("Note"))?;
        if let Some(guid) = &self.guid {
            write_string_field(o, "guid", 1, guid)?;
        }
        if let Some(title) = &self.title {
            write_string_field(o, "title", 2, title)?;
        }
        if let Some(content) = &self.content {
            write_string_field(o, "content", 3, content)?;
        }
        if let Some(created) = self.created {
            write_field(o, "created", TType::I64, 6, |o| o.write_i64(created))?;
        }
        if let Some(updated) = self.updated {
            write_field(o, "updated", TType::I64, 7, |o| o.write_i64(updated))?;
        }
        if let Some(notebook_guid) = &self.notebook_guid {
            write_string_field(o, "notebookGuid", 11, notebook_guid)?;
        }
        if let Some(tag_names) = &self.tag_names {
            write_string_list_field(o, "tagNames", 15, tag_names)?;
        }
        o.write_field_stop()?;
        o.write_struct_end()
    }
}

impl ThriftRead for Note {
    fn read_from_in_protocol(i: &mut dyn TInputProtocol) -> thrift::Result<Self> {
        let mut note = Self::default();
        read_fields(i, |i, ttype, id| {
            match (id, ttype) {
                (1, TType::String) => note.guid = Some(i.read_string()?),
                (2, TType::String) => note.title = Some(i.read_string()?),
                (3, TType::String) => note.content = Some(i.read_string()?),
                (6, TType::I64) => note.created = Some(i.read_i64()?),
                (7, TType::I64) => note.updated = Some(i.read_i64()?),
                (11, TType::String) => note.notebook_guid = Some(i.read_string()?),
                (15, TType::List) => {
                    note.tag_names = Some(read_list(i, TType::String, read_string_elem)?)
                }
                _ => i.skip(ttype)?,
            }
            Ok(())
        })?;
        Ok(note)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    pub id: Option<i32>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl ThriftRead for User {
    fn read_from_in_protocol(i: &mut dyn TInputProtocol) -> thrift::Result<Self> {
        let mut user = Self::default();
        read_fields(i, |i, ttype, id| {
            match (id, ttype) {
                (1, TType::I32) => user.id = Some(i.read_i32()?),
                (2, TType::String) => user.username = Some(i.read_string()?),
                (3, TType::String) => user.email = Some(i.read_string()?),
                (4, TType::String) => user.name = Some(i.read_string()?),
                _ => i.skip(ttype)?,
            }
            Ok(())
        })?;
        Ok(user)
    }
}

// ============ EXCEPTIONS ============

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdamUserException {
    pub error_code: EdamErrorCode,
    pub parameter: Option<String>,
}

impl ThriftRead for EdamUserException {
    fn read_from_in_protocol(i: &mut dyn TInputProtocol) -> thrift::Result<Self> {
        let mut error_code = EdamErrorCode::Unknown;
        let mut parameter = None;
        read_fields(i, |i, ttype, id| {
            match (id, ttype) {
                (1, TType::I32) => error_code = EdamErrorCode::from_i32(i.read_i32()?),
                (2, TType::String) => parameter = Some(i.read_string()?),
                _ => i.skip(ttype)?,
            }
            Ok(())
        })?;
        Ok(Self {
            error_code,
            parameter,
        })
    }
}

impl From<EdamUserException> for NoteError {
    fn from(exc: EdamUserException) -> Self {
        let detail = match exc.parameter {
            Some(parameter) => format!("{} ({})", exc.error_code.name(), parameter),
            None => exc.error_code.name(),
        };
        exc.error_code.into_error(detail)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdamSystemException {
    pub error_code: EdamErrorCode,
    pub message: Option<String>,
    /// Seconds to wait before retrying, set with `RATE_LIMIT_REACHED`
    pub rate_limit_duration: Option<i32>,
}

impl ThriftRead for EdamSystemException {
    fn read_from_in_protocol(i: &mut dyn TInputProtocol) -> thrift::Result<Self> {
        let mut error_code = EdamErrorCode::Unknown;
        let mut message = None;
        let mut rate_limit_duration = None;
        read_fields(i, |i, ttype, id| {
            match (id, ttype) {
                (1, TType::I32) => error_code = EdamErrorCode::from_i32(i.read_i32()?),
                (2, TType::String) => message = Some(i.read_string()?),
                (3, TType::I32) => rate_limit_duration = Some(i.read_i32()?),
                _ => i.skip(ttype)?,
            }
            Ok(())
        })?;
        Ok(Self {
            error_code,
            message,
            rate_limit_duration,
        })
    }
}

impl From<EdamSystemException> for NoteError {
    fn from(exc: EdamSystemException) -> Self {
        if exc.error_code == EdamErrorCode::RateLimitReached {
            let seconds = exc.rate_limit_duration.unwrap_or(0).max(0);
            return NoteError::RateLimited {
                retry_after_seconds: seconds.unsigned_abs(),
            };
        }
        let detail = match exc.message {
            Some(message) => format!("{}: {}", exc.error_code.name(), message),
            None => exc.error_code.name(),
        };
        exc.error_code.into_error(detail)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdamNotFoundException {
    pub identifier: Option<String>,
    pub key: Option<String>,
}

impl ThriftRead for EdamNotFoundException {
    fn read_from_in_protocol(i: &mut dyn TInputProtocol) -> thrift::Result<Self> {
        let mut exc = Self::default();
        read_fields(i, |i, ttype, id| {
            match (id, ttype) {
                (1, TType::String) => exc.identifier = Some(i.read_string()?),
                (2, TType::String) => exc.key = Some(i.read_string()?),
                _ => i.skip(ttype)?,
            }
            Ok(())
        })?;
        Ok(exc)
    }
}

impl From<EdamNotFoundException> for NoteError {
    fn from(exc: EdamNotFoundException) -> Self {
        let what = exc.identifier.as_deref().unwrap_or("object");
        match exc.key {
            Some(key) => NoteError::Remote(format!("{} not found: {}", what, key)),
            None => NoteError::Remote(format!("{} not found", what)),
        }
    }
}

// ============ CALLS ============

type ReadResult<T> = fn(&mut dyn TInputProtocol, TType) -> thrift::Result<T>;

/// One encoded request plus the knowledge of how to decode its reply
pub struct EdamCall<T> {
    method: &'static str,
    seq_id: i32,
    body: Vec<u8>,
    read_result: ReadResult<T>,
}

impl<T> EdamCall<T> {
    fn new<F>(
        method: &'static str,
        seq_id: i32,
        write_args: F,
        read_result: ReadResult<T>,
    ) -> NoteResult<Self>
    where
        F: FnOnce(&mut dyn TOutputProtocol) -> thrift::Result<()>,
    {
        let mut body = Vec::new();
        {
            let mut o = TBinaryOutputProtocol::new(&mut body, true);
            o.write_message_begin(&TMessageIdentifier::new(method, TMessageType::Call, seq_id))?;
            o.write_struct_begin(&TStructIdentifier::new(format!("{}_args", method)))?;
            write_args(&mut o)?;
            o.write_field_stop()?;
            o.write_struct_end()?;
            o.write_message_end()?;
            o.flush()?;
        }
        Ok(Self {
            method,
            seq_id,
            body,
            read_result,
        })
    }

    pub fn method(&self) -> &'static str {
        self.method
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Decodes the reply: field 0 is the result, fields 1-3 declared exceptions
    pub fn decode_reply(&self, bytes: &[u8]) -> NoteResult<T> {
        let mut i = TBinaryInputProtocol::new(bytes, true);
        let header = i.read_message_begin()?;

        if header.message_type == TMessageType::Exception {
            let exc = thrift::Error::read_application_error_from_in_protocol(&mut i)?;
            return Err(NoteError::Remote(format!(
                "{} failed: {}",
                self.method, exc.message
            )));
        }
        if header.message_type != TMessageType::Reply {
            return Err(invalid_data(format!(
                "expected a reply, got {:?}",
                header.message_type
            ))
            .into());
        }
        if header.name != self.method {
            return Err(invalid_data(format!(
                "reply is for {}, expected {}",
                header.name, self.method
            ))
            .into());
        }
        if header.sequence_number != self.seq_id {
            return Err(invalid_data(format!(
                "reply sequence id {} does not match {}",
                header.sequence_number, self.seq_id
            ))
            .into());
        }

        let mut result = None;
        let mut failure: Option<NoteError> = None;
        read_fields(&mut i, |i, ttype, id| {
            match (id, ttype) {
                (0, _) => result = Some((self.read_result)(i, ttype)?),
                (1, TType::Struct) => {
                    failure = Some(EdamUserException::read_from_in_protocol(i)?.into());
                }
                (2, TType::Struct) => {
                    failure = Some(EdamSystemException::read_from_in_protocol(i)?.into());
                }
                (3, TType::Struct) => {
                    failure = Some(EdamNotFoundException::read_from_in_protocol(i)?.into());
                }
                _ => i.skip(ttype)?,
            }
            Ok(())
        })?;
        i.read_message_end()?;

        if let Some(err) = failure {
            return Err(err);
        }
        result.ok_or_else(|| {
            invalid_data(format!("{} reply carried no result", self.method)).into()
        })
    }
}

fn read_string_result(i: &mut dyn TInputProtocol, ttype: TType) -> thrift::Result<String> {
    expect_type(ttype, TType::String)?;
    i.read_string()
}

fn read_struct_result<T: ThriftRead>(
    i: &mut dyn TInputProtocol,
    ttype: TType,
) -> thrift::Result<T> {
    expect_type(ttype, TType::Struct)?;
    T::read_from_in_protocol(i)
}

fn read_notebooks_result(
    i: &mut dyn TInputProtocol,
    ttype: TType,
) -> thrift::Result<Vec<Notebook>> {
    expect_type(ttype, TType::List)?;
    read_list(i, TType::Struct, Notebook::read_from_in_protocol)
}

impl EdamCall<String> {
    /// `UserStore.getNoteStoreUrl(1: authenticationToken)`
    pub fn get_note_store_url(token: &str, seq_id: i32) -> NoteResult<Self> {
        Self::new(
            "getNoteStoreUrl",
            seq_id,
            |o| write_string_field(o, "authenticationToken", 1, token),
            read_string_result,
        )
    }
}

impl EdamCall<User> {
    /// `UserStore.getUser(1: authenticationToken)`
    pub fn get_user(token: &str, seq_id: i32) -> NoteResult<Self> {
        Self::new(
            "getUser",
            seq_id,
            |o| write_string_field(o, "authenticationToken", 1, token),
            read_struct_result::<User>,
        )
    }
}

impl EdamCall<Vec<Notebook>> {
    /// `NoteStore.listNotebooks(1: authenticationToken)`
    pub fn list_notebooks(token: &str, seq_id: i32) -> NoteResult<Self> {
        Self::new(
            "listNotebooks",
            seq_id,
            |o| write_string_field(o, "authenticationToken", 1, token),
            read_notebooks_result,
        )
    }
}

impl EdamCall<Notebook> {
    /// `NoteStore.createNotebook(1: authenticationToken, 2: notebook)`
    pub fn create_notebook(token: &str, notebook: &Notebook, seq_id: i32) -> NoteResult<Self> {
        Self::new(
            "createNotebook",
            seq_id,
            |o| {
                write_string_field(o, "authenticationToken", 1, token)?;
                write_struct_field(o, "notebook", 2, notebook)
            },
            read_struct_result::<Notebook>,
        )
    }
}

impl EdamCall<Note> {
    /// `NoteStore.createNote(1: authenticationToken, 2: note)`
    pub fn create_note(token: &str, note: &Note, seq_id: i32) -> NoteResult<Self> {
        Self::new(
            "createNote",
            seq_id,
            |o| {
                write_string_field(o, "authenticationToken", 1, token)?;
                write_struct_field(o, "note", 2, note)
            },
            read_struct_result::<Note>,
        )
    }
}
