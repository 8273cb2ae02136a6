//! Method signature derivation.
//!
//! A signature is the ordered concatenation of per-argument type codes in
//! parentheses, followed by the return code: `(JJ[Ljava/lang/String;ZZJ)V`.

use super::value::{Arg, ArrayArg, ReturnKind};

/// Type code of the foreign string class.
pub const STRING_CODE: &str = "Ljava/lang/String;";

/// Type code of a foreign string array.
pub const STRING_ARRAY_CODE: &str = "[Ljava/lang/String;";

/// Method name the foreign runtime uses for constructors.
pub const CONSTRUCTOR_NAME: &str = "<init>";

impl ArrayArg<'_> {
    /// Type code of this array.
    #[must_use]
    pub const fn type_code(&self) -> &'static str {
        match self {
            ArrayArg::Byte(_) => "[B",
            ArrayArg::Int(_) => "[I",
            ArrayArg::Long(_) => "[J",
            ArrayArg::Float(_) => "[F",
            ArrayArg::Double(_) => "[D",
        }
    }
}

impl Arg<'_> {
    /// Type code of this argument.
    #[must_use]
    pub const fn type_code(&self) -> &'static str {
        match self {
            Arg::Bool(_) => "Z",
            Arg::Char(_) => "C",
            Arg::Byte(_) => "B",
            Arg::Short(_) => "S",
            Arg::Int(_) => "I",
            Arg::Long(_) => "J",
            Arg::Float(_) => "F",
            Arg::Double(_) => "D",
            Arg::Text(_) => STRING_CODE,
            Arg::StringList(_) => STRING_ARRAY_CODE,
            Arg::Array(array) => array.type_code(),
        }
    }
}

impl ReturnKind {
    /// Type code appended after the parameter list.
    #[must_use]
    pub const fn type_code(&self) -> &'static str {
        match self {
            ReturnKind::Void => "V",
            ReturnKind::Bool => "Z",
            ReturnKind::Int => "I",
            ReturnKind::Long => "J",
            ReturnKind::Float => "F",
            ReturnKind::Double => "D",
            ReturnKind::String => STRING_CODE,
            ReturnKind::ByteArray => "[B",
        }
    }
}

/// Concatenate the type codes of `args`, without parentheses.
#[must_use]
pub fn parameter_signature(args: &[Arg<'_>]) -> String {
    args.iter().map(Arg::type_code).collect()
}

/// Full method signature for `args` returning `ret`.
#[must_use]
pub fn method_signature(args: &[Arg<'_>], ret: ReturnKind) -> String {
    let params = parameter_signature(args);
    let ret = ret.type_code();
    let mut signature = String::with_capacity(params.len() + ret.len() + 2);
    signature.push('(');
    signature.push_str(&params);
    signature.push(')');
    signature.push_str(ret);
    signature
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counterpart_constructor_signature() {
        let headers: Vec<String> = Vec::new();
        let args = [
            Arg::from(0i64),
            Arg::from(0i64),
            Arg::from(&headers),
            Arg::from(false),
            Arg::from(true),
            Arg::from(3_600_000i64),
        ];
        assert_eq!(parameter_signature(&args), "JJ[Ljava/lang/String;ZZJ");
        assert_eq!(
            method_signature(&args, ReturnKind::Void),
            "(JJ[Ljava/lang/String;ZZJ)V"
        );
    }

    #[test]
    fn test_scalar_codes() {
        let args = [
            Arg::Bool(true),
            Arg::Char(b'a'),
            Arg::Byte(1),
            Arg::Short(2),
            Arg::Int(3),
            Arg::Long(4),
            Arg::Float(5.0),
            Arg::Double(6.0),
        ];
        assert_eq!(parameter_signature(&args), "ZCBSIJFD");
    }

    #[test]
    fn test_array_codes_follow_element_width() {
        assert_eq!(Arg::array(&[1u8][..]).type_code(), "[B");
        assert_eq!(Arg::array(&[1i8][..]).type_code(), "[B");
        assert_eq!(Arg::array(&[1i32][..]).type_code(), "[I");
        assert_eq!(Arg::array(&[1u32][..]).type_code(), "[I");
        assert_eq!(Arg::array(&[1i64][..]).type_code(), "[J");
        assert_eq!(Arg::array(&[1u64][..]).type_code(), "[J");
        assert_eq!(Arg::array(&[1.0f32][..]).type_code(), "[F");
        assert_eq!(Arg::array(&[1.0f64][..]).type_code(), "[D");
    }

    #[test]
    fn test_return_codes() {
        assert_eq!(method_signature(&[], ReturnKind::Void), "()V");
        assert_eq!(method_signature(&[], ReturnKind::Bool), "()Z");
        assert_eq!(method_signature(&[], ReturnKind::Int), "()I");
        assert_eq!(method_signature(&[], ReturnKind::Long), "()J");
        assert_eq!(method_signature(&[], ReturnKind::Float), "()F");
        assert_eq!(method_signature(&[], ReturnKind::Double), "()D");
        assert_eq!(
            method_signature(&[], ReturnKind::String),
            "()Ljava/lang/String;"
        );
        assert_eq!(method_signature(&[], ReturnKind::ByteArray), "()[B");
    }

    #[test]
    fn test_text_and_close_signatures() {
        assert_eq!(
            method_signature(&[Arg::from("msg")], ReturnKind::Void),
            "(Ljava/lang/String;)V"
        );
        assert_eq!(
            method_signature(&[Arg::from(1000i32), Arg::from("bye")], ReturnKind::Void),
            "(ILjava/lang/String;)V"
        );
    }
}
