use warp::{reject::Rejection, Filter};

use super::jwt::{verify_jwt_session, JwtSessionData};

pub fn with_auth() -> impl Filter<Extract = ((),), Error = Rejection> + Copy {
    warp::cookie::<String>("session").and_then(|session: String| async move {
        verify_jwt_session(session)
            .map(|_| ())
            .map_err(Rejection::from)
    })
}

pub fn with_session() -> impl Filter<Extract = (JwtSessionData,), Error = Rejection> + Copy {
    warp::cookie::<String>("session")
        .and_then(|session: String| async move { verify_jwt_session(session).map_err(Rejection::from) })
}

pub fn with_possible_session(
) -> impl Filter<Extract = (Option<JwtSessionData>,), Error = std::convert::Infallible> + Copy {
    warp::cookie::optional::<String>("session")
        .map(move |session: Option<String>| session.and_then(|session| verify_jwt_session(session).ok()))
}
