//! Static catalog of the problem kinds this API emits.
use http::StatusCode;

use crate::api::problem::Problem;

/// Static error definition from catalog
#[derive(Debug, Clone, Copy)]
pub struct ErrDef {
    pub status: u16,
    pub title: &'static str,
}

impl ErrDef {
    /// Convert this error definition into a Problem with the given detail
    #[inline]
    pub fn to_problem(&self, detail: impl Into<String>) -> Problem {
        Problem::new(
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            self.title,
            detail,
        )
    }
}

pub const BAD_REQUEST: ErrDef = ErrDef {
    status: 400,
    title: "Bad Request",
};

pub const NOT_FOUND: ErrDef = ErrDef {
    status: 404,
    title: "Not Found",
};

pub const METHOD_NOT_ALLOWED: ErrDef = ErrDef {
    status: 405,
    title: "Method Not Allowed",
};

pub const UNPROCESSABLE_ENTITY: ErrDef = ErrDef {
    status: 422,
    title: "Unprocessable Entity",
};

pub const INTERNAL_SERVER_ERROR: ErrDef = ErrDef {
    status: 500,
    title: "Internal Server Error",
};

/// Detail sent for every 500; the real cause only goes to the logs.
pub const INTERNAL_DETAIL: &str = "internal server error";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn err_def_to_problem_works() {
        let problem = NOT_FOUND.to_problem("resource not found");
        assert_eq!(problem.status, 404);
        assert_eq!(problem.title, "Not Found");
        assert_eq!(problem.detail, "resource not found");
        assert_eq!(problem.type_url, "about:blank");
    }

    #[test]
    fn unknown_status_falls_back_to_500() {
        let def = ErrDef {
            status: 42,
            title: "Odd",
        };
        assert_eq!(def.to_problem("x").status, 500);
    }
}
